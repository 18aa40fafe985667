//! Data flags for Remote API queries
//!
//! Most services take an integer `flags` parameter that selects which optional
//! properties the server returns. Each query family has its own closed set of
//! named flags; [`join`] reduces any collection of them to the wire value.

/// A named capability flag with a fixed integer value
pub trait Flag {
    fn bits(&self) -> u32;
}

/// Reduce a flag collection to a single bitmask
///
/// Duplicates are harmless and an empty collection yields `0`.
pub fn join<F, I>(flags: I) -> u32
where
    F: Flag,
    I: IntoIterator<Item = F>,
{
    flags.into_iter().fold(0, |acc, flag| acc | flag.bits())
}

impl<F: Flag> Flag for &F {
    fn bits(&self) -> u32 {
        (**self).bits()
    }
}

/// Flags for unit (`avl_unit`) queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitFlag {
    GeneralProperties,
    CustomProperties,
    CustomFields,
    Messages,
    AdvancedProperties,
    LastMessageAndPosition,
    Sensors,
    Counters,
    MessageParameters,
    Connection,
    Position,
}

impl Flag for UnitFlag {
    fn bits(&self) -> u32 {
        match self {
            Self::GeneralProperties => 0x0000_0001,
            Self::CustomProperties => 0x0000_0002,
            Self::CustomFields => 0x0000_0008,
            Self::Messages => 0x0000_0020,
            Self::AdvancedProperties => 0x0000_0100,
            Self::LastMessageAndPosition => 0x0000_0400,
            Self::Sensors => 0x0000_1000,
            Self::Counters => 0x0000_2000,
            Self::MessageParameters => 0x0010_0000,
            Self::Connection => 0x0020_0000,
            Self::Position => 0x0040_0000,
        }
    }
}

/// Flags for resource (`avl_resource`) queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceFlag {
    Base,
    CustomProperties,
    BillingProperties,
    CustomFields,
    Messages,
    Guid,
    AdministrativeFields,
    Drivers,
    Jobs,
    Notifications,
    Pois,
    Geofences,
    ReportTemplates,
}

impl Flag for ResourceFlag {
    fn bits(&self) -> u32 {
        match self {
            Self::Base => 0x0000_0001,
            Self::CustomProperties => 0x0000_0002,
            Self::BillingProperties => 0x0000_0004,
            Self::CustomFields => 0x0000_0008,
            Self::Messages => 0x0000_0020,
            Self::Guid => 0x0000_0040,
            Self::AdministrativeFields => 0x0000_0080,
            Self::Drivers => 0x0000_0100,
            Self::Jobs => 0x0000_0200,
            Self::Notifications => 0x0000_0400,
            Self::Pois => 0x0000_0800,
            Self::Geofences => 0x0000_1000,
            Self::ReportTemplates => 0x0000_2000,
        }
    }
}

/// Flags for `resource/get_zone_data`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaFlag {
    Square,
    Perimeter,
    BoundsAndCenter,
    Points,
    Base,
}

impl Flag for AreaFlag {
    fn bits(&self) -> u32 {
        match self {
            Self::Square => 0x01,
            Self::Perimeter => 0x02,
            Self::BoundsAndCenter => 0x04,
            Self::Points => 0x08,
            Self::Base => 0x10,
        }
    }
}

/// Flags for `messages/load_interval`
///
/// Message type occupies the high byte of the low word (selected by the
/// default `0xFF00` mask); data and event sub-flags sit in the low bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageFlag {
    // Message type
    Data,
    Sms,
    Command,
    Event,
    Log,

    // Data message contents
    Position,
    Input,
    Output,
    State,
    Alarm,
    Driver,
    Lbs,

    // Event kinds
    SimpleEvent,
    Violation,
    Maintenance,
    RouteControl,
}

impl Flag for MessageFlag {
    fn bits(&self) -> u32 {
        match self {
            Self::Data => 0x0000,
            Self::Sms => 0x0100,
            Self::Command => 0x0200,
            Self::Event => 0x0600,
            Self::Log => 0x1000,
            Self::Position => 0x01,
            Self::Input => 0x02,
            Self::Output => 0x04,
            Self::State => 0x08,
            Self::Alarm => 0x10,
            Self::Driver => 0x20,
            Self::Lbs => 0x20000,
            Self::SimpleEvent => 0x0,
            Self::Violation => 0x1,
            Self::Maintenance => 0x2,
            Self::RouteControl => 0x4,
        }
    }
}
