//! List commands implementation

use crate::programmers;

/// List all supported programmers
pub fn list_programmers() {
    print!("{}", programmers::programmer_help());

    #[cfg(feature = "ft4222")]
    match iceflash_ft4222::Ft4222::list_devices() {
        Ok(devices) if devices.is_empty() => println!("\nNo FT4222H connected"),
        Ok(devices) => {
            println!();
            for device in devices {
                println!("  {}", device);
            }
        }
        Err(e) => log::warn!("Could not enumerate USB devices: {}", e),
    }
}
