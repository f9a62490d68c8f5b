/**
 * Default capacity of the channel carrying scan events from the platform to the session.
 */
pub const SCAN_EVENT_CHANNEL_SIZE: usize = 64;

/**
 * Capacity of the channel that tells the presentation the registry changed. A single pending
 * notification is enough to trigger a redraw.
 */
pub const SESSION_EVENT_CHANNEL_SIZE: usize = 1;

/**
 * How long (milliseconds) connecting to a peripheral may take.
 */
pub const CONNECT_DEADLINE: u64 = 10000;

/**
 * How long (milliseconds) service discovery may take.
 */
pub const DISCOVER_DEADLINE: u64 = 10000;

/**
 * How long (milliseconds) disconnecting from a peripheral may take.
 */
pub const DISCONNECT_DEADLINE: u64 = 2000;
