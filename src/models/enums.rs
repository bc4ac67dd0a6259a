use crate::db::DatabaseError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form is used both in SQLite columns and on the wire.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

str_enum!(Department {
    GeneralPhysician => "General Physician",
    Dental => "Dental",
    Ent => "ENT",
    Orthopedic => "Orthopedic",
    Cardiology => "Cardiology",
    Pediatrics => "Pediatrics",
});

str_enum!(AppointmentStatus {
    Scheduled => "Scheduled",
    Completed => "Completed",
    Cancelled => "Cancelled",
});

str_enum!(DoctorStatus {
    Available => "Available",
    Busy => "Busy",
    Off => "Off",
});

impl AppointmentStatus {
    /// Terminal statuses accept no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Statuses reachable from `self` in one step.
    pub fn allowed_transitions(&self) -> &'static [AppointmentStatus] {
        match self {
            Self::Scheduled => &[Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn department_round_trips_display_names() {
        for dept in Department::ALL {
            assert_eq!(Department::from_str(dept.as_str()).unwrap(), *dept);
        }
        assert_eq!(Department::from_str("ENT").unwrap(), Department::Ent);
    }

    #[test]
    fn unknown_department_is_invalid_enum() {
        let err = Department::from_str("Astrology").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
        // Names are case-sensitive
        assert!(Department::from_str("cardiology").is_err());
    }

    #[test]
    fn serde_uses_display_strings() {
        let json = serde_json::to_string(&Department::GeneralPhysician).unwrap();
        assert_eq!(json, "\"General Physician\"");
        let parsed: AppointmentStatus = serde_json::from_str("\"Cancelled\"").unwrap();
        assert_eq!(parsed, AppointmentStatus::Cancelled);
        assert!(serde_json::from_str::<DoctorStatus>("\"Sleeping\"").is_err());
    }

    #[test]
    fn only_scheduled_transitions() {
        use AppointmentStatus::*;
        assert!(Scheduled.can_transition_to(Completed));
        assert!(Scheduled.can_transition_to(Cancelled));
        assert!(!Scheduled.can_transition_to(Scheduled));
        for terminal in [Completed, Cancelled] {
            assert!(terminal.is_terminal());
            for next in AppointmentStatus::ALL {
                assert!(!terminal.can_transition_to(*next));
            }
        }
        assert!(!Scheduled.is_terminal());
    }
}
