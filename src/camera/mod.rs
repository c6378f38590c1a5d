//! V4L2 camera backend for the capture loop
//!
//! [`V4l2Camera`] implements [`crate::scan::CameraSource`]: each acquired
//! stream owns the device exclusively until its tracks are stopped.

mod config;
mod device;

pub use config::{CameraConfig, DeviceSelector, PixelFormat};
pub use device::{CameraDevice, CameraStream, V4l2Camera};

use crate::error::{Error, Result};
use std::io;

/// `/dev/video*` indices checked during discovery
const MAX_DEVICE_INDEX: usize = 10;

/// List capture-capable V4L2 devices
pub fn list_devices() -> Result<Vec<CameraDevice>> {
    let mut devices = Vec::new();
    for index in 0..MAX_DEVICE_INDEX {
        if let Some(device) = query_device(index)? {
            devices.push(device);
        }
    }

    if devices.is_empty() {
        return Err(Error::CameraNotFound(
            "No V4L2 capture devices found".to_string(),
        ));
    }
    Ok(devices)
}

/// Resolve `selector` against the devices currently plugged in
pub fn resolve(selector: &DeviceSelector) -> Result<CameraDevice> {
    pick(list_devices()?, selector)
}

fn pick(devices: Vec<CameraDevice>, selector: &DeviceSelector) -> Result<CameraDevice> {
    devices
        .into_iter()
        .find(|d| selector.accepts(d.index, &d.name))
        .ok_or_else(|| Error::CameraNotFound(format!("No device matching {selector:?}")))
}

/// Query one index; `None` when it is missing or cannot capture video
fn query_device(index: usize) -> Result<Option<CameraDevice>> {
    let path = format!("/dev/video{index}");
    let dev = match v4l::Device::new(index) {
        Ok(dev) => dev,
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
            return Err(Error::CameraDenied(format!("{path}: {err}")));
        }
        Err(_) => return Ok(None),
    };

    let Ok(caps) = dev.query_caps() else {
        return Ok(None);
    };
    if !caps
        .capabilities
        .contains(v4l::capability::Flags::VIDEO_CAPTURE)
    {
        return Ok(None);
    }

    Ok(Some(CameraDevice {
        index,
        path,
        name: caps.card,
        driver: caps.driver,
        bus_info: caps.bus,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(index: usize, name: &str) -> CameraDevice {
        CameraDevice {
            index,
            path: format!("/dev/video{index}"),
            name: name.to_string(),
            driver: "uvcvideo".to_string(),
            bus_info: String::new(),
        }
    }

    #[test]
    fn test_pick_by_name_and_index() {
        let devices = vec![device(0, "Integrated Camera"), device(2, "Elgato Facecam")];

        let by_name = pick(devices.clone(), &DeviceSelector::Name("facecam".into())).unwrap();
        assert_eq!(by_name.index, 2);

        let first = pick(devices.clone(), &DeviceSelector::First).unwrap();
        assert_eq!(first.index, 0);

        assert!(matches!(
            pick(devices, &DeviceSelector::Index(1)),
            Err(Error::CameraNotFound(_))
        ));
    }

    #[test]
    fn test_list_devices() {
        // Only meaningful where V4L2 devices exist
        match list_devices() {
            Ok(devices) => assert!(devices.iter().all(|d| d.index < MAX_DEVICE_INDEX)),
            Err(e) => println!("No cameras available (expected on CI): {}", e),
        }
    }
}
