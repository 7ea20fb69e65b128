//! Helper executable for inspecting cell and system descriptor images.

use std::{path::Path, process::ExitCode};

use cell_config::{CellConfig, ParseConfigError, SectionKind, SystemConfig, SYSTEM_HEADER_SIZE};
use cell_config_raw::{CELL_SIGNATURE, SYSTEM_SIGNATURE};
use cli::parse_arguments;

pub mod cli;
pub mod logging;

fn main() -> ExitCode {
    match parse_arguments() {
        cli::Action::Inspect { path, verbose } => {
            logging::init_logging(verbose);
            inspect(&path)
        }
    }
}

/// Loads the image at `path`, detects its descriptor type by signature, and
/// prints its layout.
fn inspect(path: &Path) -> ExitCode {
    let image = match std::fs::read(path) {
        Ok(image) => image,
        Err(error) => {
            log::error!("failed to read {}: {error}", path.display());
            return ExitCode::FAILURE;
        }
    };
    log::debug!("read {} bytes from {}", image.len(), path.display());

    let result = match image.first_chunk::<6>() {
        Some(signature) if *signature == SYSTEM_SIGNATURE => inspect_system(&image),
        Some(signature) if *signature == CELL_SIGNATURE => inspect_cell(&image),
        Some(signature) => {
            log::error!("unrecognized descriptor signature {signature:02x?}");
            return ExitCode::FAILURE;
        }
        None => {
            log::error!("image is too small to carry a descriptor signature");
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("malformed descriptor: {error}");
            ExitCode::FAILURE
        }
    }
}

/// Parses `image` as a system descriptor and prints its layout.
fn inspect_system(image: &[u8]) -> Result<(), ParseConfigError> {
    let system = SystemConfig::parse(image)?;

    println!("system descriptor, {} bytes", system.total_size());
    println!("  flags:             {:#010x}", system.flags().0);

    let memory = system.hypervisor_memory();
    println!(
        "  hypervisor memory: {:#x}..{:#x}",
        { memory.phys_start },
        { memory.phys_start } + { memory.size }
    );

    let console = system.debug_console();
    println!(
        "  debug console:     type {:#06x} at {:#x}",
        { console.kind }.0,
        { console.address }
    );

    let platform = system.platform_info();
    println!("  pci mmconfig base: {:#x}", { platform.pci_mmconfig_base });

    println!("root cell at offset {SYSTEM_HEADER_SIZE:#x}:");
    print_cell(&system.root_cell());

    Ok(())
}

/// Parses `image` as a cell descriptor and prints its layout.
fn inspect_cell(image: &[u8]) -> Result<(), ParseConfigError> {
    let cell = CellConfig::parse(image)?;
    println!("cell descriptor, {} bytes", cell.total_size());
    print_cell(&cell);

    Ok(())
}

/// Prints the header fields and section table of a parsed cell descriptor.
fn print_cell(cell: &CellConfig) {
    println!("  name:  {}", cell.name().unwrap_or("<invalid utf-8>"));
    println!("  id:    {}", cell.id());
    println!("  flags: {:#010x}", cell.flags().0);

    if let Some(max_cpu_id) = cell.cpu_set().max_cpu_id() {
        log::debug!("max assignable cpu id: {max_cpu_id}");
    }

    let layout = cell.layout();
    let counts = cell.counts();
    println!("  sections:");
    for kind in SectionKind::ALL {
        println!(
            "    {:<18} offset {:#8x}  count {:>6}  element {:>2} bytes  total {:>8} bytes",
            kind.name(),
            layout.offset(kind),
            counts.count(kind),
            kind.element_size(),
            layout.section_len(kind),
        );
    }
}
