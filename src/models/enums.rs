use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
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
    };
}

str_enum!(AppointmentStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        Self::Pending,
        Self::Confirmed,
        Self::Completed,
        Self::Cancelled,
    ];

    /// `completed` and `cancelled` have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Cancelled appointments free their slots.
    pub fn occupies_slots(self) -> bool {
        self != Self::Cancelled
    }

    /// Documented lifecycle:
    /// pending → confirmed → completed, pending → cancelled, confirmed → cancelled.
    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Confirmed, Self::Completed)
                | (Self::Confirmed, Self::Cancelled)
        )
    }

    /// Quick-action shortcuts offered for an appointment in this status.
    pub fn quick_actions(self) -> &'static [QuickAction] {
        match self {
            Self::Pending => &[QuickAction::Confirm, QuickAction::Cancel],
            Self::Confirmed | Self::Completed | Self::Cancelled => &[],
        }
    }
}

str_enum!(QuickAction {
    Confirm => "confirm",
    Cancel => "cancel",
});

impl QuickAction {
    pub fn target_status(self) -> AppointmentStatus {
        match self {
            Self::Confirm => AppointmentStatus::Confirmed,
            Self::Cancel => AppointmentStatus::Cancelled,
        }
    }
}

str_enum!(Role {
    SuperAdmin => "super_admin",
    Receptionist => "receptionist",
    Dentist => "dentist",
    Accountant => "accountant",
});

impl Role {
    pub const ALL: [Role; 4] = [
        Self::SuperAdmin,
        Self::Receptionist,
        Self::Dentist,
        Self::Accountant,
    ];

    pub(crate) fn bit(self) -> u8 {
        match self {
            Self::SuperAdmin => 1 << 0,
            Self::Receptionist => 1 << 1,
            Self::Dentist => 1 << 2,
            Self::Accountant => 1 << 3,
        }
    }
}

str_enum!(ChangeRequestType {
    Reschedule => "reschedule",
    Cancel => "cancel",
});

str_enum!(ChangeRequestStatus {
    Pending => "pending",
    Resolved => "resolved",
});

str_enum!(Weekday {
    Monday => "monday",
    Tuesday => "tuesday",
    Wednesday => "wednesday",
    Thursday => "thursday",
    Friday => "friday",
    Saturday => "saturday",
    Sunday => "sunday",
});

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn appointment_status_round_trip() {
        for (variant, s) in [
            (AppointmentStatus::Pending, "pending"),
            (AppointmentStatus::Confirmed, "confirmed"),
            (AppointmentStatus::Completed, "completed"),
            (AppointmentStatus::Cancelled, "cancelled"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(AppointmentStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn rescheduled_is_not_a_status() {
        assert!(AppointmentStatus::from_str("rescheduled").is_err());
    }

    #[test]
    fn lifecycle_transitions() {
        use AppointmentStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        for next in AppointmentStatus::ALL {
            assert!(!Completed.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn quick_actions_only_for_pending() {
        assert_eq!(
            AppointmentStatus::Pending.quick_actions(),
            &[QuickAction::Confirm, QuickAction::Cancel]
        );
        assert!(AppointmentStatus::Confirmed.quick_actions().is_empty());
        assert!(AppointmentStatus::Completed.quick_actions().is_empty());
        assert!(AppointmentStatus::Cancelled.quick_actions().is_empty());
    }

    #[test]
    fn every_offered_quick_action_is_a_valid_transition() {
        for status in AppointmentStatus::ALL {
            for action in status.quick_actions() {
                assert!(status.can_transition_to(action.target_status()), "{status} {action}");
            }
        }
    }

    #[test]
    fn role_bits_are_distinct() {
        let mut seen = 0u8;
        for role in Role::ALL {
            assert_eq!(seen & role.bit(), 0);
            seen |= role.bit();
        }
        assert_eq!(seen, 0b1111);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&AppointmentStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
        let role: Role = serde_json::from_str("\"super_admin\"").unwrap();
        assert_eq!(role, Role::SuperAdmin);
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(Role::from_str("janitor").is_err());
        assert!(ChangeRequestType::from_str("").is_err());
    }
}
