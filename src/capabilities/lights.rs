//! Smart-home lighting behind a [`DeviceBridge`] seam.

use std::sync::Arc;

use async_trait::async_trait;

use crate::tools::{ParameterKind, ToolDefinition, handler_fn};

use super::{CapabilityBundle, CapabilityError, optional_u64, required_str};

/// One discovered smart device.
#[derive(Debug, Clone)]
pub struct SmartDevice {
    pub alias: String,
    pub kind: String,
    pub is_on: bool,
}

/// Smart-home backend seam.
#[async_trait]
pub trait DeviceBridge: Send + Sync {
    /// All devices the bridge can see.
    async fn list_devices(&self) -> Result<Vec<SmartDevice>, CapabilityError>;

    /// Switch a light on or off, optionally setting brightness (1–100).
    async fn set_light(
        &self,
        alias: &str,
        on: bool,
        brightness: Option<u8>,
    ) -> Result<(), CapabilityError>;
}

fn format_devices(devices: &[SmartDevice]) -> String {
    if devices.is_empty() {
        return "No smart devices were found on the network.".to_string();
    }
    let lines: Vec<String> = devices
        .iter()
        .map(|d| {
            format!(
                "{} ({}, {})",
                d.alias,
                d.kind,
                if d.is_on { "on" } else { "off" }
            )
        })
        .collect();
    format!(
        "Found {} smart device(s): {}",
        devices.len(),
        lines.join("; ")
    )
}

/// Bundle the lighting tools over `bridge`.
pub fn bundle(bridge: Arc<dyn DeviceBridge>) -> CapabilityBundle {
    let mut bundle = CapabilityBundle::new();

    let br = Arc::clone(&bridge);
    bundle.push(
        ToolDefinition::new(
            "list_smart_devices",
            "List the smart devices on the home network.",
        ),
        handler_fn(move |_args| {
            let br = Arc::clone(&br);
            async move {
                let devices = br.list_devices().await?;
                Ok(serde_json::json!({ "result": format_devices(&devices) }))
            }
        }),
    );

    let br = Arc::clone(&bridge);
    bundle.push(
        ToolDefinition::new("control_light", "Turn a smart light on or off.")
            .required_param("alias", ParameterKind::String, "Device name, e.g. 'desk lamp'")
            .required_param(
                "state",
                ParameterKind::String,
                "Desired state: 'on' or 'off'",
            )
            .optional_param(
                "brightness",
                ParameterKind::Integer,
                "Brightness percentage, 1 to 100",
            ),
        handler_fn(move |args| {
            let br = Arc::clone(&br);
            async move {
                let alias = required_str(&args, "alias")?;
                let state = required_str(&args, "state")?;
                let on = match state.to_lowercase().as_str() {
                    "on" => true,
                    "off" => false,
                    other => {
                        return Err(CapabilityError::InvalidInput(format!(
                            "state must be 'on' or 'off', got '{other}'"
                        ))
                        .into());
                    }
                };
                let brightness = match optional_u64(&args, "brightness") {
                    Some(pct @ 1..=100) => Some(pct as u8),
                    Some(pct) => {
                        return Err(CapabilityError::InvalidInput(format!(
                            "brightness must be between 1 and 100, got {pct}"
                        ))
                        .into());
                    }
                    None => None,
                };
                br.set_light(&alias, on, brightness).await?;
                let spoken = match (on, brightness) {
                    (true, Some(pct)) => format!("Turned '{alias}' on at {pct}% brightness."),
                    (true, None) => format!("Turned '{alias}' on."),
                    (false, _) => format!("Turned '{alias}' off."),
                };
                Ok(serde_json::json!({ "result": spoken }))
            }
        }),
    );

    bundle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolHandler;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryBridge {
        devices: Mutex<Vec<SmartDevice>>,
    }

    #[async_trait]
    impl DeviceBridge for MemoryBridge {
        async fn list_devices(&self) -> Result<Vec<SmartDevice>, CapabilityError> {
            Ok(self.devices.lock().expect("devices lock").clone())
        }

        async fn set_light(
            &self,
            alias: &str,
            on: bool,
            _brightness: Option<u8>,
        ) -> Result<(), CapabilityError> {
            let mut devices = self.devices.lock().expect("devices lock");
            let device = devices
                .iter_mut()
                .find(|d| d.alias == alias)
                .ok_or_else(|| CapabilityError::NotFound(format!("device: {alias}")))?;
            device.is_on = on;
            Ok(())
        }
    }

    fn args(pairs: &[(&str, serde_json::Value)]) -> crate::tools::ArgMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn bridge_with_lamp() -> Arc<MemoryBridge> {
        let bridge = MemoryBridge::default();
        bridge.devices.lock().unwrap().push(SmartDevice {
            alias: "desk lamp".to_string(),
            kind: "bulb".to_string(),
            is_on: false,
        });
        Arc::new(bridge)
    }

    #[tokio::test]
    async fn listing_reports_state() {
        let bridge = bridge_with_lamp();
        let bundle = bundle(Arc::clone(&bridge) as Arc<dyn DeviceBridge>);
        let (_, list) = &bundle.entries[0];

        let out = list.call(args(&[])).await.unwrap();
        assert_eq!(
            out["result"],
            "Found 1 smart device(s): desk lamp (bulb, off)"
        );
    }

    #[tokio::test]
    async fn control_flips_the_switch() {
        let bridge = bridge_with_lamp();
        let bundle = bundle(Arc::clone(&bridge) as Arc<dyn DeviceBridge>);
        let (_, control) = &bundle.entries[1];

        let out = control
            .call(args(&[
                ("alias", serde_json::json!("desk lamp")),
                ("state", serde_json::json!("on")),
                ("brightness", serde_json::json!(40)),
            ]))
            .await
            .unwrap();
        assert_eq!(out["result"], "Turned 'desk lamp' on at 40% brightness.");
        assert!(bridge.devices.lock().unwrap()[0].is_on);
    }

    #[tokio::test]
    async fn bogus_state_and_brightness_are_rejected() {
        let bridge = bridge_with_lamp();
        let bundle = bundle(Arc::clone(&bridge) as Arc<dyn DeviceBridge>);
        let (_, control) = &bundle.entries[1];

        let err = control
            .call(args(&[
                ("alias", serde_json::json!("desk lamp")),
                ("state", serde_json::json!("dim")),
            ]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'on' or 'off'"));

        let err = control
            .call(args(&[
                ("alias", serde_json::json!("desk lamp")),
                ("state", serde_json::json!("on")),
                ("brightness", serde_json::json!(250)),
            ]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("between 1 and 100"));
    }
}
