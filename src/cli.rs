use core::fmt::Write;

use embassy_nrf::uarte;
use embedded_cli::cli::CliBuilder;
use embedded_cli::{Command, codes};
use log::warn;
use si4703::registers::{BAND_BOTTOM, BAND_TOP};
use static_cell::ConstStaticCell;

use crate::console::Console;
use crate::events::{self, SystemEvent};

pub const DEL: u8 = 127; // Delete character

#[derive(Debug, Command)]
enum BaseCommand {
    Tune {
        #[command(subcommand)]
        command: TuneCommand,
    },
    Volume {
        #[command(subcommand)]
        command: VolumeCommand,
    },
    /// Toggle mute
    Mute,
    /// Show channel, signal and RDS data
    Status,
}

#[derive(Debug, Command)]
enum TuneCommand {
    /// Seek up
    Up,
    /// Seek down
    Down,
    /// Tune to a channel
    Channel {
        /// Channel in tenths of MHz (973 = 97.3 MHz)
        channel: u16,
    },
}

#[derive(Debug, Command)]
enum VolumeCommand {
    /// Increase volume
    Up,
    /// Decrease volume
    Down,
    /// Set volume to specific level
    Set {
        /// Volume level (0-15)
        level: u8,
    },
}

fn submit(event: SystemEvent) -> &'static str {
    if events::event_try_send(event) {
        "OK"
    } else {
        "Busy, try again"
    }
}

#[embassy_executor::task]
pub async fn cli_task(mut rx: uarte::UarteRx<'static>) {
    static COMMAND_BUFFER: ConstStaticCell<[u8; 40]> = ConstStaticCell::new([0; 40]);
    static HISTORY_BUFFER: ConstStaticCell<[u8; 41]> = ConstStaticCell::new([0; 41]);

    let Ok(mut cli) = CliBuilder::default()
        .writer(Console)
        .command_buffer(COMMAND_BUFFER.take().as_mut_slice())
        .history_buffer(HISTORY_BUFFER.take().as_mut_slice())
        .build()
    else {
        warn!("CLI setup failed");
        return;
    };

    loop {
        let buffer = &mut [0u8; 1];
        if let Err(e) = rx.read(buffer).await {
            warn!("Console read failed: {:?}", e);
            continue;
        }
        if buffer[0] == DEL { // Currently CLI does not handle DEL
            buffer[0] = codes::BACKSPACE;
        }

        let _ = cli.process_byte::<BaseCommand, _>(
            buffer[0],
            &mut BaseCommand::processor(|cli, command| {
                let reply = match command {
                    BaseCommand::Tune { command } => match command {
                        TuneCommand::Up => submit(SystemEvent::RadioSeekUp),
                        TuneCommand::Down => submit(SystemEvent::RadioSeekDown),
                        TuneCommand::Channel { channel } => {
                            if (BAND_BOTTOM..=BAND_TOP).contains(&channel) {
                                submit(SystemEvent::RadioSetChannel(channel))
                            } else {
                                "Channel out of band (875-1080)"
                            }
                        }
                    },
                    BaseCommand::Volume { command } => match command {
                        VolumeCommand::Up => submit(SystemEvent::RadioVolumeUp),
                        VolumeCommand::Down => submit(SystemEvent::RadioVolumeDown),
                        VolumeCommand::Set { level } => submit(SystemEvent::RadioVolumeSet(level)),
                    },
                    BaseCommand::Mute => submit(SystemEvent::RadioMuteToggle),
                    BaseCommand::Status => submit(SystemEvent::RadioStatus),
                };
                let _ = cli.writer().write_str(reply);
                Ok(())
            }),
        );
    }
}
