// Scripted instrument for --mock runs.
//
// The mock stream only answers the exact exchange a subcommand is going to
// perform, so each subcommand gets its own script.

use std::time::Duration;

use anyhow::Result;

use msalib_micronix::commands::{self, CMD_LEVEL_UNIT_DBM};
use msalib_micronix::{Preset, Setting};
use msalib_test_harness::MockStream;

use crate::{ActionArg, Command, PresetAction};

/// Canned reply for a setting query.
fn canned_value(setting: Setting) -> &'static str {
    match setting {
        Setting::Freq => "1.0G",
        Setting::Span => "2M",
        Setting::Ref => "-20",
        Setting::Rbw => "100K",
        Setting::Vbw => "100K",
        Setting::Meas => "OFF",
        Setting::CpMode => "TOTAL",
        Setting::CpCenter => "1.0G",
        Setting::CpWidth => "1M",
        Setting::AcpMode => "TOTAL",
        Setting::Calc => "OFF",
        Setting::MaxCount
        | Setting::MinCount
        | Setting::AveCount
        | Setting::OvrCount => "0",
        Setting::Scale => "10",
        Setting::Sweep => "AUTO",
        Setting::Det => "POS",
        Setting::Trg => "INT",
        Setting::Mkr => "NORM",
        Setting::NormalMarker => "250",
        Setting::Peak => "NORM",
        Setting::PeakSearch => "01",
    }
}

fn line(text: &str) -> Vec<u8> {
    format!("{text}\r\n").into_bytes()
}

fn expect_ok(mock: &mut MockStream, command: &str) {
    mock.expect(&line(command), b"OK\r\n");
}

fn expect_query(mock: &mut MockStream, setting: Setting) {
    mock.expect(
        &line(setting.descriptor().query),
        &line(canned_value(setting)),
    );
}

fn expect_write(mock: &mut MockStream, setting: Setting, value: &str) -> Result<()> {
    for cmd in commands::cmd_write(setting, value)? {
        expect_ok(mock, &cmd.text);
    }
    Ok(())
}

/// A 1 GHz / 2 MHz sweep with a single carrier in the middle.
fn sweep_dump() -> Vec<(Duration, Vec<u8>)> {
    let header = line("CF 1.0G SP 2M RF -20 ST 0.1S RB 100K VB 100K SC 10");
    let samples: Vec<String> = (0..=1000)
        .map(|i: i32| {
            let offset = f64::from((i - 500).abs());
            format!("{:.2}", -80.0 + 60.0 / (1.0 + offset / 4.0))
        })
        .collect();
    let half = samples.len() / 2;
    vec![
        (Duration::ZERO, header),
        (Duration::from_millis(50), line(&samples[..half].join(" "))),
        (Duration::from_millis(50), line(&samples[half..].join(" "))),
    ]
}

/// Build a mock stream that plays the instrument side of `command`.
pub fn scripted_stream(command: &Command, preset: Option<&Preset>) -> Result<MockStream> {
    let mut mock = MockStream::new();
    expect_ok(&mut mock, CMD_LEVEL_UNIT_DBM);

    match command {
        Command::Info => {
            expect_query(&mut mock, Setting::Freq);
            expect_query(&mut mock, Setting::Span);
            expect_query(&mut mock, Setting::Ref);
        }
        Command::Get { name } => {
            // Unknown names fail before anything is sent.
            if let Ok(setting) = name.parse::<Setting>() {
                expect_query(&mut mock, setting);
            }
        }
        Command::Set { name, value } => {
            if let Ok(setting) = name.parse::<Setting>() {
                // Rejected values fail before anything is sent.
                expect_write(&mut mock, setting, value).ok();
            }
        }
        Command::Sweep { .. } => {
            mock.expect_bursts(&line(commands::CMD_SWEEP_DUMP), sweep_dump());
        }
        Command::Measure => {
            mock.expect(
                &line(commands::CMD_MEASUREMENT_RESULT),
                &line("CP -12.30dBm"),
            );
        }
        Command::Action { action } => {
            let text = match action {
                ActionArg::Hold => commands::CMD_HOLD,
                ActionArg::Run => commands::CMD_RUN,
                ActionArg::FreqSetMarker => commands::CMD_FREQ_SET_MARKER,
                ActionArg::Auto => commands::CMD_AUTO,
                ActionArg::MarkerReset => commands::CMD_MARKER_RESET,
            };
            expect_ok(&mut mock, text);
        }
        Command::Preset {
            action: PresetAction::Save { .. },
        } => {
            for setting in Setting::ALL {
                expect_query(&mut mock, setting);
            }
        }
        Command::Preset {
            action: PresetAction::Load { .. },
        } => {
            if let Some(preset) = preset {
                for (setting, value) in preset.entries() {
                    expect_write(&mut mock, setting, value)?;
                }
            }
        }
        Command::List => {}
    }
    Ok(mock)
}
