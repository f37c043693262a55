use colored::Colorize;
use herosync::api::{CmdMessage, MessageLevel, StatusReport};
use herosync::model::{human_bytes, FileRecord, Status};

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

pub(super) fn print_files(files: &[FileRecord]) {
    if files.is_empty() {
        println!("No files found.");
        return;
    }

    for file in files {
        let line = file.display_line();
        let colored = match file.status {
            Status::InSync => line.green(),
            Status::OnlyRemote => line.cyan(),
            Status::OnlyLocalIncoming => line.normal(),
            Status::OutOfSync => line.red(),
            Status::Processed => line.dimmed(),
        };
        println!("{}", colored);
    }
}

pub(super) fn print_status(report: &StatusReport) {
    println!("{}", "Camera".bold());
    println!("  {:<12} {}", "Model:", report.hardware.model_name);
    println!("  {:<12} {}", "Serial:", report.hardware.serial_number);
    println!("  {:<12} {}", "Firmware:", report.hardware.firmware_version);
    println!("  {:<12} {}", "Address:", report.base_url);

    let storage = &report.storage;
    let used = storage.sd_capacity.saturating_sub(storage.sd_remaining);
    println!(
        "  {:<12} {} used of {} ({} free)",
        "SD card:",
        human_bytes(used),
        human_bytes(storage.sd_capacity),
        human_bytes(storage.sd_remaining)
    );

    println!();
    println!("{}", "Inventory".bold());
    for (status, count) in &report.counts {
        let line = format!("  {} {:<28} {:>5}", status.symbol(), status.description(), count);
        if *count == 0 {
            println!("{}", line.dimmed());
        } else {
            println!("{}", line);
        }
    }
    println!(
        "  {:<30} {:>5}  ({})",
        "Total",
        report.total_files,
        human_bytes(report.total_bytes)
    );
}
