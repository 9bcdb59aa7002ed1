//! RavenBoot boot environment menu - UEFI application
//!
//! Reads the list of boot environments from the ESP, lets the operator pick
//! one and reports the choice to the next boot stage.

#![cfg_attr(target_os = "uefi", no_std)]
#![cfg_attr(target_os = "uefi", no_main)]

#[cfg(target_os = "uefi")]
extern crate alloc;

#[cfg(target_os = "uefi")]
mod efi_console;

#[cfg(target_os = "uefi")]
mod app {
    use alloc::boxed::Box;
    use alloc::vec::Vec;
    use core::fmt::Write;

    use log::{error, info, warn};
    use uefi::prelude::*;
    use uefi::proto::console::text::{Color, Output};
    use uefi::proto::loaded_image::LoadedImage;
    use uefi::proto::media::file::{Directory, File, FileAttribute, FileInfo, FileMode, FileType};
    use uefi::proto::media::fs::SimpleFileSystem;
    use uefi::CString16;

    use raven_bemenu::config::CONFIG_PATHS;
    use raven_bemenu::{MenuConfig, MenuSession};

    use crate::efi_console::EfiConsole;

    /// Bootloader version
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Main entry point
    #[entry]
    fn main(image_handle: Handle, mut system_table: SystemTable<Boot>) -> Status {
        // Initialize UEFI services (also sets up allocator and logger)
        if uefi::helpers::init(&mut system_table).is_err() {
            return Status::ABORTED;
        }

        {
            let stdout = system_table.stdout();
            let _ = stdout.clear();
            let _ = stdout.set_color(Color::LightGray, Color::Black);
        }

        let config = match load_config(system_table.boot_services(), image_handle) {
            Ok(cfg) => cfg,
            Err(status) => {
                warn!("bemenu: no usable config ({:?}), using defaults", status);
                MenuConfig::default()
            }
        };

        let mut session = MenuSession::from_config(config);
        let result = {
            let mut console = EfiConsole::new(&mut system_table);
            session.run(&mut console)
        };

        let stdout = system_table.stdout();
        let _ = stdout.clear();
        print_banner(stdout);

        match result {
            Ok(Some(be)) => {
                info!("bemenu: booting '{}' from {}", be.name(), be.path());
                let _ = stdout.set_color(Color::White, Color::Black);
                let _ = writeln!(stdout, "Booting: {} ({})", be.name(), be.path());
                Status::SUCCESS
            }
            Ok(None) => {
                let _ = stdout.set_color(Color::Yellow, Color::Black);
                let _ = writeln!(stdout, "No boot environments found");
                Status::NOT_FOUND
            }
            Err(err) => {
                error!("bemenu: {}", err);
                let _ = stdout.set_color(Color::Red, Color::Black);
                let _ = writeln!(stdout, "Boot environment menu failed: {}", err);
                Status::DEVICE_ERROR
            }
        }
    }

    fn print_banner(stdout: &mut Output) {
        let _ = stdout.set_color(Color::LightCyan, Color::Black);
        let _ = writeln!(stdout, "");
        let _ = writeln!(stdout, "  +-------------------------------+");
        let _ = writeln!(stdout, "  |       R A V E N   B O O T     |");
        let _ = writeln!(stdout, "  |    Boot Environment Menu      |");
        let _ = writeln!(stdout, "  +-------------------------------+");
        let _ = writeln!(stdout, "              v{}", VERSION);
        let _ = writeln!(stdout, "");
    }

    /// Load the menu configuration from the first known path on the ESP
    fn load_config(boot_services: &BootServices, image_handle: Handle) -> Result<MenuConfig, Status> {
        // Get device handle from our loaded image
        let loaded_image = boot_services
            .open_protocol_exclusive::<LoadedImage>(image_handle)
            .map_err(|err| err.status())?;

        let device_handle = loaded_image.device().ok_or(Status::NOT_FOUND)?;

        // Open filesystem
        let mut fs = boot_services
            .open_protocol_exclusive::<SimpleFileSystem>(device_handle)
            .map_err(|err| err.status())?;

        let mut root = fs.open_volume().map_err(|err| err.status())?;

        for config_path in CONFIG_PATHS {
            let Ok(data) = read_file_from_root(&mut root, config_path) else {
                continue;
            };
            match MenuConfig::parse(&data) {
                Ok(config) => {
                    info!(
                        "bemenu: {} boot environments from {}",
                        config.entries.len(),
                        config_path
                    );
                    return Ok(config);
                }
                Err(err) => warn!("bemenu: {}: {}", config_path, err),
            }
        }

        Err(Status::NOT_FOUND)
    }

    /// Read a whole file from the ESP root
    fn read_file_from_root(root: &mut Directory, path: &str) -> Result<Vec<u8>, Status> {
        // Convert path to UCS-2
        let path_cstr = CString16::try_from(path).map_err(|_| Status::INVALID_PARAMETER)?;

        let file_handle = root
            .open(&path_cstr, FileMode::Read, FileAttribute::empty())
            .map_err(|err| err.status())?;

        let mut file = match file_handle.into_type().map_err(|err| err.status())? {
            FileType::Regular(f) => f,
            FileType::Dir(_) => return Err(Status::NOT_FOUND),
        };

        let info: Box<FileInfo> = file.get_boxed_info().map_err(|err| err.status())?;
        let file_size = info.file_size() as usize;

        let mut buffer = Vec::new();
        buffer.resize(file_size, 0);
        let read = file.read(&mut buffer).map_err(|err| err.status())?;
        buffer.truncate(read);

        Ok(buffer)
    }
}

#[cfg(not(target_os = "uefi"))]
fn main() {
    eprintln!("raven-bemenu is a UEFI application: cargo build --target x86_64-unknown-uefi");
    std::process::exit(1);
}
