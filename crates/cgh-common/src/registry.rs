//! Static registry of plants, intermediary servers, and controllers.
//!
//! The registry maps a (plant, server, controller) selection to the
//! [`ConnectionDescriptor`] the backend needs. It is plain data: adding a
//! plant means adding an entry, either in [`Registry::builtin`] or in a TOML
//! registry file.

use crate::config::ConfigError;
use crate::descriptor::{port_string, ConnectionDescriptor, RegisterRead, RegisterReads};
use crate::error::{IdentifierKind, MonitorError, MonitorResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A controller (CLP) reachable through an intermediary server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerEntry {
    /// Numeric controller id.
    pub id: u32,
    /// Generating unit label.
    pub ug: String,
    /// Controller address.
    pub ip: String,
    /// Controller port.
    #[serde(with = "port_string")]
    pub port: u16,
    /// Registers read from this controller.
    #[serde(default)]
    pub readings: RegisterReads,
}

/// An intermediary server that talks to the controllers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    /// Server address.
    pub ip: String,
    /// Server port.
    #[serde(with = "port_string")]
    pub port: u16,
    /// Controllers keyed by id.
    #[serde(default)]
    pub controllers: BTreeMap<String, ControllerEntry>,
}

/// A plant (usina).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantEntry {
    /// Display name.
    pub name: String,
    /// Logical table name on the backend.
    pub table: String,
    /// Servers keyed by id.
    #[serde(default)]
    pub servers: BTreeMap<String, ServerEntry>,
}

/// One resolvable selection with a display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionOption {
    /// Plant id.
    pub plant_id: String,
    /// Server id.
    pub server_id: String,
    /// Controller id.
    pub controller_id: String,
    /// Label such as "CGH Aparecida - UG-01 (principal)".
    pub label: String,
}

/// The (plant, server, controller) a session monitors.
///
/// Any identifier may be missing; the session reports that as an incomplete
/// configuration instead of failing at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    /// Plant id.
    pub plant: Option<String>,
    /// Server id.
    pub server: Option<String>,
    /// Controller id.
    pub controller: Option<String>,
}

impl Selection {
    /// Build a complete selection.
    pub fn new(
        plant: impl Into<String>,
        server: impl Into<String>,
        controller: impl Into<String>,
    ) -> Self {
        Self {
            plant: Some(plant.into()),
            server: Some(server.into()),
            controller: Some(controller.into()),
        }
    }

    /// Borrow all three identifiers, or report which are missing.
    ///
    /// Empty strings count as missing.
    pub fn ids(&self) -> MonitorResult<(&str, &str, &str)> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|v| !v.trim().is_empty())
        }

        match (
            present(&self.plant),
            present(&self.server),
            present(&self.controller),
        ) {
            (Some(p), Some(s), Some(c)) => Ok((p, s, c)),
            (p, s, c) => {
                let missing: Vec<&str> = [
                    (p.is_none(), "plant"),
                    (s.is_none(), "server"),
                    (c.is_none(), "controller"),
                ]
                .iter()
                .filter(|(absent, _)| *absent)
                .map(|(_, name)| *name)
                .collect();
                Err(MonitorError::ConfigIncomplete {
                    reason: format!("missing {}", missing.join(", ")),
                })
            }
        }
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.plant.as_deref().unwrap_or("-"),
            self.server.as_deref().unwrap_or("-"),
            self.controller.as_deref().unwrap_or("-")
        )
    }
}

/// Registry keyed plant → server → controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    /// Plants keyed by id.
    #[serde(default)]
    pub plants: BTreeMap<String, PlantEntry>,
}

impl Registry {
    /// Registry for CGH Aparecida, unit UG-01.
    #[must_use]
    pub fn builtin() -> Self {
        let readings = RegisterReads {
            real: vec![
                RegisterRead::new("UHLM_PressaoOleo", 13289),
                RegisterRead::new("UHLM_VazaoOleo", 13291),
                RegisterRead::new("UHRV_PressaoOleo", 13301),
                RegisterRead::new("Turbina_MontanteBorboleta", 13315),
                RegisterRead::new("Turbina_PosicaoDistribuidor", 13317),
                RegisterRead::new("Gerador_FaseAB", 13385),
                RegisterRead::new("Gerador_FaseBC", 13387),
                RegisterRead::new("Gerador_FaseCA", 13389),
                RegisterRead::new("MED_750450_AR1_RTD1", 13455),
                RegisterRead::new("MED_750450_AR1_RTD2", 13457),
                RegisterRead::new("QCC_NivelMontante_Grade", 13519),
                RegisterRead::new("QCC_NivelJusante_Grade", 13521),
            ],
            int: vec![
                RegisterRead::new("Reserva_13296", 13303),
                RegisterRead::new("F50_U_Neutro", 13391),
                RegisterRead::new("F50L_U_FaseAB", 13385),
                RegisterRead::new("F50L_U_FaseBC", 13387),
                RegisterRead::new("Turbina_Velocidade", 13321),
            ],
            dint: Vec::new(),
            time: Vec::new(),
        };

        let ug01 = ControllerEntry {
            id: 1,
            ug: "UG-01".into(),
            ip: "192.168.10.2".into(),
            port: 502,
            readings,
        };

        let principal = ServerEntry {
            ip: "100.110.212.125".into(),
            port: 8000,
            controllers: BTreeMap::from([("ug01".to_string(), ug01)]),
        };

        let aparecida = PlantEntry {
            name: "CGH Aparecida".into(),
            table: "cgh_aparecida".into(),
            servers: BTreeMap::from([("principal".to_string(), principal)]),
        };

        Self {
            plants: BTreeMap::from([("aparecida".to_string(), aparecida)]),
        }
    }

    /// Load a registry from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a registry from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Serialize the registry to a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Resolve a selection to the descriptor sent to the backend.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::NotFound`] naming the first identifier that is
    /// absent, checked in plant, server, controller order.
    pub fn resolve(
        &self,
        plant_id: &str,
        server_id: &str,
        controller_id: &str,
    ) -> MonitorResult<ConnectionDescriptor> {
        let plant = self
            .plants
            .get(plant_id)
            .ok_or_else(|| not_found(IdentifierKind::Plant, plant_id))?;
        let server = plant
            .servers
            .get(server_id)
            .ok_or_else(|| not_found(IdentifierKind::Server, server_id))?;
        let controller = server
            .controllers
            .get(controller_id)
            .ok_or_else(|| not_found(IdentifierKind::Controller, controller_id))?;

        Ok(ConnectionDescriptor {
            table: plant.table.clone(),
            id: controller.id,
            ug: controller.ug.clone(),
            server_ip: server.ip.clone(),
            server_port: server.port,
            controller_ip: controller.ip.clone(),
            controller_port: controller.port,
            readings: controller.readings.clone(),
        })
    }

    /// Resolve a [`Selection`], reporting missing identifiers first.
    ///
    /// # Errors
    ///
    /// [`MonitorError::ConfigIncomplete`] if an identifier is missing,
    /// [`MonitorError::NotFound`] if one is unknown.
    pub fn resolve_selection(&self, selection: &Selection) -> MonitorResult<ConnectionDescriptor> {
        let (plant, server, controller) = selection.ids()?;
        self.resolve(plant, server, controller)
    }

    /// Display name of a plant, if registered.
    #[must_use]
    pub fn plant_name(&self, plant_id: &str) -> Option<&str> {
        self.plants.get(plant_id).map(|p| p.name.as_str())
    }

    /// Every resolvable selection.
    #[must_use]
    pub fn options(&self) -> Vec<SelectionOption> {
        let mut options = Vec::new();
        for (plant_id, plant) in &self.plants {
            for (server_id, server) in &plant.servers {
                for (controller_id, controller) in &server.controllers {
                    options.push(SelectionOption {
                        plant_id: plant_id.clone(),
                        server_id: server_id.clone(),
                        controller_id: controller_id.clone(),
                        label: format!("{} - {} ({})", plant.name, controller.ug, server_id),
                    });
                }
            }
        }
        options
    }

    /// Display label of a selection, falling back to its raw identifiers
    /// when it does not resolve.
    #[must_use]
    pub fn label(&self, selection: &Selection) -> String {
        let resolved = selection.ids().ok().and_then(|(p, s, c)| {
            let plant = self.plants.get(p)?;
            let controller = plant.servers.get(s)?.controllers.get(c)?;
            Some(format!("{} - {} ({})", plant.name, controller.ug, s))
        });
        resolved.unwrap_or_else(|| selection.to_string())
    }
}

fn not_found(kind: IdentifierKind, id: &str) -> MonitorError {
    MonitorError::NotFound {
        kind,
        id: id.to_string(),
    }
}
