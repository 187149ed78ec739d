#![no_std]
#![no_main]

use core::fmt::Write as _;

use embassy_executor::Spawner;
use embassy_futures::select::{Either, select};
use embassy_futures::yield_now;
use embassy_nrf::gpio::{Level, Output, OutputDrive};
use embassy_nrf::peripherals::{SERIAL0, SERIAL1};
use embassy_nrf::{bind_interrupts, uarte};
use embassy_time::{Delay, Timer};
use log::{info, warn};
use panic_probe as _;

use embassy_nrf::twim::{self, Twim};
use static_cell::ConstStaticCell;

mod cli;
pub mod console;
pub mod events;
mod serial_logger;

use events::{NotifyPublisher, NotifySubscriber, SystemEvent, SystemNotify};
use si4703::tuner::VOLUME_MAX;
use si4703::{Config, I2cRegisterBus, RdsPoll, SeekDirection, Si4703, TuneResult};

type Radio = Si4703<I2cRegisterBus<Twim<'static>>>;

/// 97.3 MHz
const START_CHANNEL: u16 = 973;

bind_interrupts!(struct Irqs {
    SERIAL0 => uarte::InterruptHandler<SERIAL0>;
    SERIAL1 => twim::InterruptHandler<SERIAL1>;
});

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());
    let mut led = Output::new(p.P0_28, Level::Low, OutputDrive::Standard);

    let mut config = uarte::Config::default();
    config.parity = uarte::Parity::EXCLUDED;
    config.baudrate = uarte::Baudrate::BAUD115200;
    let uart: uarte::Uarte<'static> = uarte::Uarte::new(p.SERIAL0, p.P0_22, p.P0_20, Irqs, config);
    let (tx, rx) = uart.split();
    console::init(tx);
    serial_logger::init().unwrap();

    // Si4703 picks 2-wire mode when SDIO is low while RST rises
    let mut sdio = p.P1_14;
    let mut reset_pin = Output::new(p.P1_03, Level::Low, OutputDrive::Standard);
    {
        let _sdio_low = Output::new(sdio.reborrow(), Level::Low, OutputDrive::Standard);
        Timer::after_millis(1).await;
        reset_pin.set_high();
        Timer::after_millis(1).await;
    }

    let config = twim::Config::default();
    static RAM_BUFFER: ConstStaticCell<[u8; 32]> = ConstStaticCell::new([0; 32]);
    let twi = Twim::new(p.SERIAL1, Irqs, sdio, p.P1_13, config, RAM_BUFFER.take());
    let mut radio: Radio = Si4703::new(I2cRegisterBus::new(twi), Config::default());
    radio.power_up(&mut Delay).expect("Radio power up failed");
    info!("Radio initialized: {:?}", radio.config());
    radio
        .tune_to_channel(START_CHANNEL)
        .expect("Initial tune failed");

    let _ = spawner.spawn(cli::cli_task(rx));
    if let Ok(subscriber) = events::notify_subscriber() {
        let _ = spawner.spawn(notify_task(subscriber));
    }
    yield_now().await;

    let notification_publisher = events::notify_publisher().unwrap();
    notification_publisher
        .publish(SystemNotify::Tuned(TuneResult::Success(START_CHANNEL)))
        .await;

    let mut pacing = RdsPoll::Idle.pacing_ms();
    let mut published = *radio.rds_info();
    loop {
        match select(events::event_receive(), Timer::after_millis(pacing)).await {
            Either::First(event) => {
                led.toggle();
                info!("Received event: {:?}", event);
                match handle_event(&mut radio, event) {
                    Ok(notify) => notification_publisher.publish(notify).await,
                    Err(e) => warn!("{:?} failed: {}", event, e),
                }
                pacing = RdsPoll::Idle.pacing_ms();
            }
            Either::Second(()) => {
                pacing = match radio.poll_rds() {
                    Ok(poll) => poll.pacing_ms(),
                    Err(e) => {
                        warn!("RDS poll failed: {}", e);
                        RdsPoll::Idle.pacing_ms()
                    }
                };
            }
        }

        if *radio.rds_info() != published {
            published = *radio.rds_info();
            notification_publisher
                .publish(SystemNotify::Rds(published))
                .await;
        }
    }
}

fn handle_event(radio: &mut Radio, event: SystemEvent) -> Result<SystemNotify, si4703::Error> {
    match event {
        SystemEvent::RadioSeekUp => radio.seek(SeekDirection::Up).map(SystemNotify::Tuned),
        SystemEvent::RadioSeekDown => radio.seek(SeekDirection::Down).map(SystemNotify::Tuned),
        SystemEvent::RadioSetChannel(channel) => {
            radio.tune_to_channel(channel)?;
            Ok(SystemNotify::Tuned(TuneResult::Success(radio.channel()?)))
        }
        SystemEvent::RadioMuteToggle => radio.toggle_mute().map(SystemNotify::MuteChanged),
        SystemEvent::RadioVolumeUp => {
            let volume = (radio.volume()? + 1).min(VOLUME_MAX);
            radio.set_volume(volume)?;
            Ok(SystemNotify::VolumeChanged(volume))
        }
        SystemEvent::RadioVolumeDown => {
            let volume = radio.volume()?.saturating_sub(1);
            radio.set_volume(volume)?;
            Ok(SystemNotify::VolumeChanged(volume))
        }
        SystemEvent::RadioVolumeSet(level) => {
            radio.set_volume(level)?;
            Ok(SystemNotify::VolumeChanged(radio.volume()?))
        }
        SystemEvent::RadioStatus => Ok(SystemNotify::Status {
            channel: radio.channel()?,
            rssi: radio.signal_strength()?,
            stereo: radio.is_stereo()?,
        }),
    }
}

fn write_channel(out: &mut impl core::fmt::Write, channel: u16) -> core::fmt::Result {
    write!(out, "{}.{}", channel / 10, channel % 10)
}

#[embassy_executor::task]
async fn notify_task(mut subscriber: NotifySubscriber) {
    loop {
        match subscriber.next_message_pure().await {
            SystemNotify::Tuned(TuneResult::Success(channel)) => {
                let mut line: heapless::String<16> = heapless::String::new();
                let _ = write_channel(&mut line, channel);
                info!("Tuned to {} MHz", line);
            }
            SystemNotify::Tuned(TuneResult::Failed) => info!("Seek found no station"),
            SystemNotify::MuteChanged(muted) => info!("Muted: {}", muted),
            SystemNotify::VolumeChanged(volume) => info!("Volume: {}", volume),
            SystemNotify::Status { channel, rssi, stereo } => {
                let mut line: heapless::String<16> = heapless::String::new();
                let _ = write_channel(&mut line, channel);
                info!(
                    "{} MHz, RSSI {} dBuV, {}",
                    line,
                    rssi,
                    if stereo { "stereo" } else { "mono" }
                );
            }
            SystemNotify::Rds(rds) => {
                info!(
                    "RDS PI {:04X} PS '{}' RT '{}'",
                    rds.program_identification,
                    rds.station_name_str(),
                    rds.radio_text_str()
                );
                let mut af: heapless::String<160> = heapless::String::new();
                for &channel in rds.alternate_frequencies() {
                    let _ = write_channel(&mut af, channel);
                    let _ = af.push(' ');
                }
                if !af.is_empty() {
                    info!("RDS AF {}", af);
                }
            }
        }
    }
}
