//! Settlement of placements on an external ledger
//!
//! Encoded placements are handed to a [`SettlementSink`]. In development the
//! sink is [`ScriptSettlement`], which runs the configured devnet script as
//!
//! ```text
//! <script> <contract_address> <entrypoint> <calldata...>
//! ```

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use placeboard_config::BackendConfig;
use tokio::process::Command;
use tracing::{info, warn};

use crate::error::CanvasError;

/// Contract function a settlement call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entrypoint {
    PlacePixel,
    PlaceExtraPixels,
}

impl Entrypoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Entrypoint::PlacePixel => "place_pixel",
            Entrypoint::PlaceExtraPixels => "place_extra_pixels",
        }
    }
}

impl std::fmt::Display for Entrypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call to submit: target entrypoint and its flat argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementCall {
    pub entrypoint: Entrypoint,
    pub calldata: Vec<u64>,
}

impl SettlementCall {
    pub fn new(entrypoint: Entrypoint, calldata: Vec<u64>) -> Self {
        Self {
            entrypoint,
            calldata,
        }
    }
}

/// Destination for encoded placements.
///
/// `Ok` means the external action confirmed; anything else must be treated
/// as not applied or unknown.
pub trait SettlementSink: Send + Sync {
    fn submit(&self, call: &SettlementCall) -> impl Future<Output = Result<(), CanvasError>> + Send;
}

/// Runs the devnet scripts through `tokio::process`
#[derive(Debug, Clone)]
pub struct ScriptSettlement {
    place_pixel_script: PathBuf,
    place_extra_pixels_script: PathBuf,
    contract_address: String,
    timeout: Duration,
}

impl ScriptSettlement {
    pub fn new(
        place_pixel_script: impl Into<PathBuf>,
        place_extra_pixels_script: impl Into<PathBuf>,
        contract_address: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            place_pixel_script: place_pixel_script.into(),
            place_extra_pixels_script: place_extra_pixels_script.into(),
            contract_address: contract_address.into(),
            timeout,
        }
    }

    /// Build from backend config.
    ///
    /// Production deployments never run devnet scripts, and a missing
    /// contract address is a configuration error.
    pub fn from_config(config: &BackendConfig) -> Result<Self, CanvasError> {
        if config.production {
            return Err(CanvasError::SettlementDisabled(
                "devnet settlement is disabled in production".to_string(),
            ));
        }

        let contract_address = config
            .contract_address
            .as_deref()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| {
                CanvasError::BackendUnavailable("Contract address not configured".to_string())
            })?;

        Ok(Self::new(
            &config.scripts.place_pixel_devnet,
            &config.scripts.place_extra_pixels_devnet,
            contract_address,
            config.timeouts.settlement(),
        ))
    }

    fn script_for(&self, entrypoint: Entrypoint) -> &PathBuf {
        match entrypoint {
            Entrypoint::PlacePixel => &self.place_pixel_script,
            Entrypoint::PlaceExtraPixels => &self.place_extra_pixels_script,
        }
    }
}

impl SettlementSink for ScriptSettlement {
    async fn submit(&self, call: &SettlementCall) -> Result<(), CanvasError> {
        let script = self.script_for(call.entrypoint);
        if script.as_os_str().is_empty() {
            return Err(CanvasError::SettlementDisabled(format!(
                "no script configured for {}",
                call.entrypoint
            )));
        }

        info!(
            "Submitting {} with {} args via {}",
            call.entrypoint,
            call.calldata.len(),
            script.display()
        );

        let mut command = Command::new(script);
        command
            .arg(&self.contract_address)
            .arg(call.entrypoint.as_str())
            .args(call.calldata.iter().map(u64::to_string))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                warn!("Failed to run {}: {}", script.display(), err);
                return Err(CanvasError::SettlementFailed(format!(
                    "failed to run {}: {}",
                    script.display(),
                    err
                )));
            }
            Err(_) => {
                warn!("{} timed out after {:?}", call.entrypoint, self.timeout);
                return Err(CanvasError::Timeout {
                    operation: "settlement",
                });
            }
        };

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            warn!("{} failed with {}", call.entrypoint, output.status);
            return Err(CanvasError::SettlementFailed(format!(
                "{} exited with {} - Output: {}",
                call.entrypoint,
                output.status,
                combined.trim()
            )));
        }

        Ok(())
    }
}

/// Sink that refuses every call, for deployments without settlement
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSettlement;

impl SettlementSink for DisabledSettlement {
    async fn submit(&self, call: &SettlementCall) -> Result<(), CanvasError> {
        Err(CanvasError::SettlementDisabled(format!(
            "{} is not available on this deployment",
            call.entrypoint
        )))
    }
}

/// Records submitted calls without side effects
#[derive(Debug, Default)]
pub struct RecordingSettlement {
    calls: Mutex<Vec<SettlementCall>>,
    failure: Option<String>,
}

impl RecordingSettlement {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder that records each call and then reports `message` as failure
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: Some(message.into()),
        }
    }

    pub fn calls(&self) -> Vec<SettlementCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl SettlementSink for RecordingSettlement {
    async fn submit(&self, call: &SettlementCall) -> Result<(), CanvasError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call.clone());

        match &self.failure {
            Some(message) => Err(CanvasError::SettlementFailed(message.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placeboard_config::ScriptsConfig;

    fn devnet_config() -> BackendConfig {
        BackendConfig {
            contract_address: Some("0x0123".to_string()),
            scripts: ScriptsConfig {
                place_pixel_devnet: "true".to_string(),
                place_extra_pixels_devnet: "false".to_string(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_entrypoint_names() {
        assert_eq!(Entrypoint::PlacePixel.as_str(), "place_pixel");
        assert_eq!(Entrypoint::PlaceExtraPixels.to_string(), "place_extra_pixels");
    }

    #[test]
    fn test_disabled_in_production() {
        let config = BackendConfig {
            production: true,
            ..devnet_config()
        };
        assert!(matches!(
            ScriptSettlement::from_config(&config),
            Err(CanvasError::SettlementDisabled(_))
        ));
    }

    #[test]
    fn test_requires_contract_address() {
        let config = BackendConfig {
            contract_address: Some(String::new()),
            ..devnet_config()
        };
        let err = ScriptSettlement::from_config(&config).unwrap_err();
        assert!(matches!(err, CanvasError::BackendUnavailable(_)));
        assert_eq!(err.code().http_status(), 500);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_script_success() {
        let sink = ScriptSettlement::from_config(&devnet_config()).unwrap();
        let call = SettlementCall::new(Entrypoint::PlacePixel, vec![0, 1, 1000]);
        assert!(sink.submit(&call).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_script_failure() {
        let sink = ScriptSettlement::from_config(&devnet_config()).unwrap();
        let call = SettlementCall::new(Entrypoint::PlaceExtraPixels, vec![1, 0, 1, 1000]);
        assert!(matches!(
            sink.submit(&call).await,
            Err(CanvasError::SettlementFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_script() {
        let sink = ScriptSettlement::new(
            "/nonexistent/placeboard/place_pixel.sh",
            "",
            "0x0123",
            Duration::from_secs(5),
        );
        let err = sink
            .submit(&SettlementCall::new(Entrypoint::PlacePixel, vec![0, 0, 0]))
            .await
            .unwrap_err();
        assert!(matches!(err, CanvasError::SettlementFailed(_)));

        let err = sink
            .submit(&SettlementCall::new(Entrypoint::PlaceExtraPixels, vec![1, 0, 0, 0]))
            .await
            .unwrap_err();
        assert!(matches!(err, CanvasError::SettlementDisabled(_)));
    }

    #[tokio::test]
    async fn test_recording_sink() {
        let sink = RecordingSettlement::new();
        let call = SettlementCall::new(Entrypoint::PlaceExtraPixels, vec![2, 5, 9, 2, 0, 1000]);
        sink.submit(&call).await.unwrap();
        assert_eq!(sink.calls(), vec![call]);

        let failing = RecordingSettlement::failing("devnet down");
        assert!(failing.submit(&SettlementCall::new(Entrypoint::PlacePixel, vec![])).await.is_err());
        assert_eq!(failing.call_count(), 1);
    }

    #[tokio::test]
    async fn test_disabled_sink() {
        let err = DisabledSettlement
            .submit(&SettlementCall::new(Entrypoint::PlacePixel, vec![0, 0, 0]))
            .await
            .unwrap_err();
        assert!(matches!(err, CanvasError::SettlementDisabled(_)));
    }
}
