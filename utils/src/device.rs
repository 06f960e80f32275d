use cpal::traits::{DeviceTrait, HostTrait};
use cpal::Device;

/// Finds the named input device, or the host default when no name is given.
pub fn get_or_default_input(device_name: Option<&str>) -> anyhow::Result<Device> {
    let host = cpal::default_host();
    tracing::debug!("audio host: {:?}", host.id());
    match device_name {
        Some(target) => host
            .input_devices()?
            .find(|device| device.name().is_ok_and(|name| name == target))
            .ok_or_else(|| anyhow::anyhow!("input device not found: {}", target)),
        None => host
            .default_input_device()
            .ok_or_else(|| anyhow::anyhow!("no default input device")),
    }
}

/// Finds the named output device, or the host default when no name is given.
pub fn get_or_default_output(device_name: Option<&str>) -> anyhow::Result<Device> {
    let host = cpal::default_host();
    match device_name {
        Some(target) => host
            .output_devices()?
            .find(|device| device.name().is_ok_and(|name| name == target))
            .ok_or_else(|| anyhow::anyhow!("output device not found: {}", target)),
        None => host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("no default output device")),
    }
}

/// One line per input device, marking the host default.
pub fn describe_inputs() -> anyhow::Result<String> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let mut lines = Vec::new();
    for device in host.input_devices()? {
        let name = device.name()?;
        let config = device.default_input_config()?;
        let mut line = format!(
            " * {} ({}ch, {}hz)",
            name,
            config.channels(),
            config.sample_rate().0
        );
        if Some(&name) == default_name.as_ref() {
            line.push_str(" [default]");
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}

/// One line per output device, marking the host default.
pub fn describe_outputs() -> anyhow::Result<String> {
    let host = cpal::default_host();
    let default_name = host.default_output_device().and_then(|d| d.name().ok());

    let mut lines = Vec::new();
    for device in host.output_devices()? {
        let name = device.name()?;
        let config = device.default_output_config()?;
        let mut line = format!(
            " * {} ({}ch, {}hz)",
            name,
            config.channels(),
            config.sample_rate().0
        );
        if Some(&name) == default_name.as_ref() {
            line.push_str(" [default]");
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}
