use candle_core::Device;

pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(dev) = Device::new_metal(0) { tracing::info!("device: Metal (MPS)"); return dev; }
    }
    tracing::info!("device: CPU");
    Device::Cpu
}

pub fn device_label(device: &Device) -> &'static str {
    if device.is_metal() { "Metal" } else if device.is_cuda() { "CUDA" } else { "CPU" }
}
