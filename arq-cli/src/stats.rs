//! Transfer summary display and formatting

use arq::{ArqMode, TransferReport};
use std::path::Path;
use std::time::Duration;

/// Format bytes in human-readable form
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a transfer duration with millisecond precision
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis >= 60_000 {
        let secs = duration.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else if millis >= 1_000 {
        format!("{:.3}s", duration.as_secs_f64())
    } else {
        format!("{}ms", millis)
    }
}

/// Format throughput in human-readable form
pub fn format_throughput(bytes_per_sec: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec as u64))
}

/// Machine-readable result line: `timeout_ms,size,window,nanos`
pub fn csv_line(timeout: Duration, report: &TransferReport, mode: ArqMode) -> String {
    format!(
        "{},{},{},{}",
        timeout.as_millis(),
        report.bytes,
        mode.window_size(),
        report.duration.as_nanos()
    )
}

/// Print the sender's completion summary followed by the CSV result line
pub fn print_send_summary(file: &Path, timeout: Duration, mode: ArqMode, report: &TransferReport) {
    println!();
    println!("~~File Transfer Completed~~");
    println!("File Name: {}", file.display());
    println!("File Size: {} bytes ({})", report.bytes, format_bytes(report.bytes));
    println!(
        "Transfer Time: {} nanoseconds ({})",
        report.duration.as_nanos(),
        format_duration(report.duration)
    );
    println!("Timeout Length: {} milliseconds", timeout.as_millis());
    println!("Mode: {}", mode);
    println!("Frames: {}", report.frames);
    println!("Retransmissions: {}", report.retransmissions);
    println!("Throughput: {}", format_throughput(report.throughput()));
    println!();
    println!("{}", csv_line(timeout, report, mode));
}

/// Print the receiver's completion summary
pub fn print_receive_summary(file: &Path, report: &TransferReport) {
    println!();
    println!("~~File Transfer Completed~~");
    println!("File Name: {}", file.display());
    println!("File Size: {} bytes ({})", report.bytes, format_bytes(report.bytes));
    println!("Transfer Time: {}", format_duration(report.duration));
    println!("Frames: {}", report.frames);
    println!("Duplicates: {}", report.duplicates);
    println!("Dropped (simulated): {}", report.dropped);
    println!("Discarded (corrupt): {}", report.discarded);
    println!();
}
