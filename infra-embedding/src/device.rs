use std::str::FromStr;

use candle_core::Device;

use ingest_domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceChoice {
    Cpu,
    Cuda,
    /// CUDA when the binary was built with it and a GPU is present, CPU otherwise.
    Auto,
}

impl FromStr for DeviceChoice {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda),
            "auto" => Ok(Self::Auto),
            other => Err(DomainError::invalid_input(&format!(
                "unknown embedding device `{other}` (expected cpu, cuda or auto)"
            ))),
        }
    }
}

pub fn select_device(choice: DeviceChoice) -> Result<Device, DomainError> {
    let device = match choice {
        DeviceChoice::Cpu => Device::Cpu,
        DeviceChoice::Cuda => Device::new_cuda(0).map_err(|err| {
            DomainError::external_service_error("embedding", &format!("CUDA unavailable: {err}"))
        })?,
        DeviceChoice::Auto => Device::cuda_if_available(0).unwrap_or(Device::Cpu),
    };

    tracing::info!(requested = ?choice, cuda = device.is_cuda(), "embedding device selected");
    Ok(device)
}
