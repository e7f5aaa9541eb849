use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::OnboardError;

/// Device lifecycle state persisted next to the credential.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    PreDi,
    PreTo1,
    Idle,
    Resale,
    Error,
}

impl DeviceState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreDi => "pre_di",
            Self::PreTo1 => "pre_to1",
            Self::Idle => "idle",
            Self::Resale => "resale",
            Self::Error => "error",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::PreDi => "device is ready for device initialization",
            Self::PreTo1 | Self::Resale => "device is ready for ownership transfer",
            Self::Idle => "device ownership transfer done",
            Self::Error => "error in getting device status",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the onboarding command should do for a given device state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingPlan {
    Onboard,
    AlreadyOnboarded,
}

impl OnboardingPlan {
    pub fn decide(state: DeviceState, resale: bool) -> Result<Self, OnboardError> {
        match state {
            DeviceState::PreTo1 | DeviceState::Resale => Ok(Self::Onboard),
            DeviceState::Idle if resale => Ok(Self::Onboard),
            DeviceState::Idle => Ok(Self::AlreadyOnboarded),
            DeviceState::PreDi => Err(OnboardError::DeviceNotInitialized),
            DeviceState::Error => Err(OnboardError::InvalidDeviceState(state)),
        }
    }
}
