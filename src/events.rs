use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::pubsub::{PubSubChannel, Publisher, Subscriber};

use si4703::{RdsInfo, TuneResult};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SystemEvent {
    RadioSeekUp,
    RadioSeekDown,
    /// Channel in tenths of MHz
    RadioSetChannel(u16),
    RadioMuteToggle,
    RadioVolumeUp,
    RadioVolumeDown,
    RadioVolumeSet(u8),
    RadioStatus,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SystemNotify {
    Tuned(TuneResult),
    MuteChanged(bool),
    VolumeChanged(u8),
    Status { channel: u16, rssi: u8, stereo: bool },
    Rds(RdsInfo),
}

const NOTIFY_CAPACITY: usize = 4;
const NOTIFY_SUBSCRIBERS: usize = 4;
const NOTIFY_PUBLISHERS: usize = 2;

pub type NotifyPublisher = Publisher<
    'static,
    ThreadModeRawMutex,
    SystemNotify,
    NOTIFY_CAPACITY,
    NOTIFY_SUBSCRIBERS,
    NOTIFY_PUBLISHERS,
>;
pub type NotifySubscriber = Subscriber<
    'static,
    ThreadModeRawMutex,
    SystemNotify,
    NOTIFY_CAPACITY,
    NOTIFY_SUBSCRIBERS,
    NOTIFY_PUBLISHERS,
>;

static NOTIFICATION_CHANNEL: PubSubChannel<
    ThreadModeRawMutex,
    SystemNotify,
    NOTIFY_CAPACITY,
    NOTIFY_SUBSCRIBERS,
    NOTIFY_PUBLISHERS,
> = PubSubChannel::new();
static EVENT_CHANNEL: Channel<ThreadModeRawMutex, SystemEvent, 1> = Channel::new();

pub fn event_try_send(event: SystemEvent) -> bool {
    EVENT_CHANNEL.try_send(event).is_ok()
}

pub async fn event_receive() -> SystemEvent {
    EVENT_CHANNEL.receive().await
}

pub fn notify_subscriber() -> Result<NotifySubscriber, embassy_sync::pubsub::Error> {
    NOTIFICATION_CHANNEL.subscriber()
}

pub fn notify_publisher() -> Result<NotifyPublisher, embassy_sync::pubsub::Error> {
    NOTIFICATION_CHANNEL.publisher()
}
