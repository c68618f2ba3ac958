//! Embedded HTML dashboard.
//!
//! A single page that receives the dashboard view over WebSocket and
//! drives polling through the REST API. No build step.

use axum::response::Html;

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>CGH Monitor</title>
    <style>
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #0f172a;
            color: #e2e8f0;
            min-height: 100vh;
        }
        .header {
            background: #1e293b;
            padding: 1rem 2rem;
            display: flex;
            flex-wrap: wrap;
            gap: 1rem;
            justify-content: space-between;
            align-items: center;
            border-bottom: 2px solid #334155;
        }
        .header h1 { font-size: 1.4rem; font-weight: 600; }
        .header .subtitle { font-size: 0.85rem; color: #94a3b8; }
        .controls { display: flex; gap: 0.5rem; align-items: center; }
        button {
            background: #334155;
            color: #e2e8f0;
            border: 1px solid #475569;
            border-radius: 0.375rem;
            padding: 0.4rem 0.9rem;
            cursor: pointer;
            font-size: 0.875rem;
        }
        button:hover { background: #475569; }
        button:disabled { opacity: 0.5; cursor: default; }
        .badge {
            padding: 0.25rem 0.75rem;
            border-radius: 9999px;
            font-size: 0.85rem;
            font-weight: 600;
        }
        .badge-Normal { background: #10b981; color: #fff; }
        .badge-Attention { background: #f59e0b; color: #000; }
        .badge-Alert { background: #ef4444; color: #fff; }
        .badge-offline { background: #374151; color: #9ca3af; }

        .info-bar {
            padding: 0.5rem 2rem;
            font-size: 0.8rem;
            color: #94a3b8;
            display: flex;
            gap: 1.5rem;
        }
        .spinner { display: none; }
        .loading .spinner { display: inline; }

        .error {
            display: none;
            margin: 1rem 2rem 0;
            padding: 0.75rem 1rem;
            border-radius: 0.375rem;
            background: #7f1d1d;
            color: #fecaca;
        }

        .container { padding: 1.5rem 2rem; }
        .grid {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(320px, 1fr));
            gap: 1.5rem;
        }
        .card {
            background: #1e293b;
            border-radius: 0.5rem;
            padding: 1.25rem;
            border: 1px solid #334155;
        }
        .card h2 {
            font-size: 0.9rem;
            text-transform: uppercase;
            letter-spacing: 0.05em;
            color: #94a3b8;
            margin-bottom: 0.75rem;
        }
        .row {
            display: flex;
            justify-content: space-between;
            padding: 0.35rem 0;
            border-bottom: 1px solid #273449;
            font-size: 0.9rem;
        }
        .row:last-child { border-bottom: none; }
        .value { font-family: 'SF Mono', Monaco, monospace; font-weight: 600; }
        .value.normal { color: #34d399; }
        .value.warning { color: #fbbf24; }
        .value.critical { color: #f87171; }
        .value.unknown { color: #6b7280; }
        .empty { color: #6b7280; font-style: italic; font-size: 0.85rem; }
    </style>
</head>
<body>
    <div class="header">
        <div>
            <h1 id="plant">CGH Monitor</h1>
            <div class="subtitle" id="selection">-</div>
        </div>
        <div class="controls">
            <span class="badge badge-offline" id="plant-status">Offline</span>
            <button id="toggle" onclick="togglePolling()">Pausar</button>
            <button id="refresh" onclick="refreshNow()">Atualizar</button>
        </div>
    </div>
    <div class="info-bar" id="info">
        <span>Última atualização: <span id="last-update">-</span></span>
        <span>Intervalo: <span id="interval">-</span></span>
        <span class="spinner">Carregando...</span>
    </div>
    <div class="error" id="error"></div>
    <div class="container">
        <div class="grid" id="panels"></div>
    </div>

    <script>
        let ws = null;
        let active = false;

        function el(id) { return document.getElementById(id); }

        function render(view) {
            active = view.active;
            el('plant').textContent = view.plant;
            el('selection').textContent = view.selection;

            const badge = el('plant-status');
            badge.textContent = view.plant_status;
            badge.className = 'badge badge-' + view.plant_status;

            el('toggle').textContent = active ? 'Pausar' : 'Retomar';
            el('toggle').disabled = view.interval_ms === 0;
            el('interval').textContent = view.interval_ms === 0 ? 'manual' : (view.interval_ms / 1000) + ' s';
            el('last-update').textContent = view.last_update
                ? new Date(view.last_update).toLocaleTimeString('pt-BR')
                : '-';
            setLoading(view.loading);

            const error = el('error');
            if (view.error_message) {
                error.textContent = view.error_message;
                error.style.display = 'block';
            } else {
                error.style.display = 'none';
            }

            const grid = el('panels');
            grid.innerHTML = '';
            for (const panel of view.panels) {
                const card = document.createElement('div');
                card.className = 'card';
                const title = document.createElement('h2');
                title.textContent = panel.title;
                card.appendChild(title);

                if (panel.entries.length === 0) {
                    const empty = document.createElement('div');
                    empty.className = 'empty';
                    empty.textContent = view.initial_load ? 'Carregando...' : 'Sem leituras';
                    card.appendChild(empty);
                }
                for (const entry of panel.entries) {
                    const row = document.createElement('div');
                    row.className = 'row';
                    const name = document.createElement('span');
                    name.textContent = entry.name.replace(/_/g, ' ');
                    const value = document.createElement('span');
                    value.className = 'value ' + entry.status;
                    value.textContent = entry.display;
                    row.appendChild(name);
                    row.appendChild(value);
                    card.appendChild(row);
                }
                grid.appendChild(card);
            }
        }

        function setLoading(loading) {
            el('info').classList.toggle('loading', loading);
            el('refresh').disabled = loading;
        }

        async function refreshNow() {
            setLoading(true);
            try {
                const resp = await fetch('/api/refresh', { method: 'POST' });
                render(await resp.json());
            } catch (e) {
                console.error('Refresh failed:', e);
                setLoading(false);
            }
        }

        async function togglePolling() {
            const route = active ? '/api/polling/stop' : '/api/polling/start';
            try {
                const resp = await fetch(route, { method: 'POST' });
                const status = await resp.json();
                if (resp.ok) {
                    active = status.active;
                    el('toggle').textContent = active ? 'Pausar' : 'Retomar';
                }
            } catch (e) {
                console.error('Polling toggle failed:', e);
            }
        }

        function connect() {
            const protocol = window.location.protocol === 'https:' ? 'wss:' : 'ws:';
            ws = new WebSocket(protocol + '//' + window.location.host + '/ws');

            ws.onclose = function() {
                const badge = el('plant-status');
                badge.textContent = 'Offline';
                badge.className = 'badge badge-offline';
                setTimeout(connect, 2000);
            };

            ws.onerror = function(err) {
                console.error('WebSocket error:', err);
            };

            ws.onmessage = function(event) {
                try {
                    const msg = JSON.parse(event.data);
                    if (msg.type === 'full') {
                        render(msg);
                    } else if (msg.type === 'loading') {
                        setLoading(true);
                    }
                } catch (e) {
                    console.error('Failed to parse WebSocket message:', e);
                }
            };
        }

        connect();
    </script>
</body>
</html>
"#;

/// Serve the embedded dashboard HTML.
///
/// GET /
/// GET /dashboard
pub async fn dashboard_handler() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}
