// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::mold::{HalfSide, MoldReport};
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report a finished mold
    pub fn report_mold(report: &MoldReport) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Mold:".bold(), report.input.display().to_string().cyan());
        println!("{}", "━".repeat(80).bright_black());

        if report.repaired {
            println!("{} {}", "🔧".yellow(), "Input was repaired before molding".yellow());
        }

        let size = report.block_bounds.size();
        println!("\n{}", "Enclosure:".bold());
        Self::print_field("Size", &format!("{:.2} × {:.2} × {:.2}", size.x, size.y, size.z));
        Self::print_field("Split", &format!("z = {:.3}", report.split_z));

        println!("\n{}", "Keys:".bold());
        Self::print_field(
            "Radius / height",
            &format!("{:.3} / {:.3}", report.keys.radius, report.keys.height),
        );
        for center in &report.keys.centers {
            Self::print_field("At", &format!("({:.2}, {:.2})", center.x, center.y));
        }

        println!("\n{}", "Spout:".bold());
        Self::print_field(
            "Half",
            match report.spout.target {
                HalfSide::Top => "top",
                HalfSide::Bottom => "bottom",
            },
        );
        Self::print_field(
            "Center",
            &format!(
                "({:.2}, {:.2}, {:.2})",
                report.spout.center.x, report.spout.center.y, report.spout.center.z
            ),
        );

        println!("\n{}", "Output:".bold());
        println!(
            "  {} {} {}",
            "Top:".bright_black(),
            report.outputs.top.display().to_string().cyan(),
            format!("({:.1} mm³)", report.top_volume).bright_black()
        );
        println!(
            "  {} {} {}",
            "Bottom:".bright_black(),
            report.outputs.bottom.display().to_string().cyan(),
            format!("({:.1} mm³)", report.bottom_volume).bright_black()
        );
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(Duration::from_millis(report.elapsed_ms)).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }

    fn print_field(name: &str, value: &str) {
        println!("  {} {}", format!("{}:", name).bright_black(), value);
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}
