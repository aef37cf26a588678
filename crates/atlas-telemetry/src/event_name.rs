//! The closed event-name registry (§4.11, §6 Event registry).
//!
//! Event names are a contract, not free text. A name that isn't in this
//! registry never reaches a telemetry sink under its own (possibly
//! mistyped) spelling; [`EventName::parse_or_invalid`] substitutes
//! [`EventName::TelemetryEventNameInvalid`] instead.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    PingInvoked,
    OnboardingGuestGuidStarted,
    OnboardingGuestGuidCreated,
    OnboardingGuestGuidCompleted,
    PlayerGet,
    PlayerCreated,
    LocationGet,
    LocationMove,
    NavigationInputParsed,
    NavigationInputAmbiguous,
    NavigationMoveSuccess,
    NavigationMoveBlocked,
    NavigationLookIssued,
    NavigationExitGenerationRequested,
    WorldLocationGenerated,
    WorldLocationUpsert,
    WorldLayerAdded,
    WorldExitCreated,
    WorldExitRemoved,
    WorldEventProcessed,
    WorldEventDuplicate,
    WorldEventDeadLettered,
    WorldClockAdvanced,
    WorldAreaGenerationRequested,
    LocationClockInitialized,
    LocationClockSynced,
    LocationClockBatchSynced,
    DescriptionGenerateStart,
    DescriptionGenerateSuccess,
    DescriptionGenerateFailure,
    DescriptionCacheHit,
    DescriptionCacheMiss,
    DescriptionIntegrityJobStart,
    DescriptionIntegrityJobComplete,
    DescriptionIntegrityComputed,
    DescriptionIntegrityUnchanged,
    DescriptionIntegrityMismatch,
    AiCostEstimated,
    AiCostWindowSummary,
    AiCostSoftThresholdCrossed,
    TelemetryEventNameInvalid,
}

impl EventName {
    pub fn as_str(self) -> &'static str {
        use EventName::*;
        match self {
            PingInvoked => "Ping.Invoked",
            OnboardingGuestGuidStarted => "Onboarding.GuestGuid.Started",
            OnboardingGuestGuidCreated => "Onboarding.GuestGuid.Created",
            OnboardingGuestGuidCompleted => "Onboarding.GuestGuid.Completed",
            PlayerGet => "Player.Get",
            PlayerCreated => "Player.Created",
            LocationGet => "Location.Get",
            LocationMove => "Location.Move",
            NavigationInputParsed => "Navigation.Input.Parsed",
            NavigationInputAmbiguous => "Navigation.Input.Ambiguous",
            NavigationMoveSuccess => "Navigation.Move.Success",
            NavigationMoveBlocked => "Navigation.Move.Blocked",
            NavigationLookIssued => "Navigation.Look.Issued",
            NavigationExitGenerationRequested => "Navigation.Exit.GenerationRequested",
            WorldLocationGenerated => "World.Location.Generated",
            WorldLocationUpsert => "World.Location.Upsert",
            WorldLayerAdded => "World.Layer.Added",
            WorldExitCreated => "World.Exit.Created",
            WorldExitRemoved => "World.Exit.Removed",
            WorldEventProcessed => "World.Event.Processed",
            WorldEventDuplicate => "World.Event.Duplicate",
            WorldEventDeadLettered => "World.Event.DeadLettered",
            WorldClockAdvanced => "World.Clock.Advanced",
            WorldAreaGenerationRequested => "World.Area.GenerationRequested",
            LocationClockInitialized => "Location.Clock.Initialized",
            LocationClockSynced => "Location.Clock.Synced",
            LocationClockBatchSynced => "Location.Clock.BatchSynced",
            DescriptionGenerateStart => "Description.Generate.Start",
            DescriptionGenerateSuccess => "Description.Generate.Success",
            DescriptionGenerateFailure => "Description.Generate.Failure",
            DescriptionCacheHit => "Description.Cache.Hit",
            DescriptionCacheMiss => "Description.Cache.Miss",
            DescriptionIntegrityJobStart => "Description.Integrity.JobStart",
            DescriptionIntegrityJobComplete => "Description.Integrity.JobComplete",
            DescriptionIntegrityComputed => "Description.Integrity.Computed",
            DescriptionIntegrityUnchanged => "Description.Integrity.Unchanged",
            DescriptionIntegrityMismatch => "Description.Integrity.Mismatch",
            AiCostEstimated => "AI.Cost.Estimated",
            AiCostWindowSummary => "AI.Cost.WindowSummary",
            AiCostSoftThresholdCrossed => "AI.Cost.SoftThresholdCrossed",
            TelemetryEventNameInvalid => "Telemetry.EventName.Invalid",
        }
    }

    pub const ALL: &'static [EventName] = &[
        EventName::PingInvoked,
        EventName::OnboardingGuestGuidStarted,
        EventName::OnboardingGuestGuidCreated,
        EventName::OnboardingGuestGuidCompleted,
        EventName::PlayerGet,
        EventName::PlayerCreated,
        EventName::LocationGet,
        EventName::LocationMove,
        EventName::NavigationInputParsed,
        EventName::NavigationInputAmbiguous,
        EventName::NavigationMoveSuccess,
        EventName::NavigationMoveBlocked,
        EventName::NavigationLookIssued,
        EventName::NavigationExitGenerationRequested,
        EventName::WorldLocationGenerated,
        EventName::WorldLocationUpsert,
        EventName::WorldLayerAdded,
        EventName::WorldExitCreated,
        EventName::WorldExitRemoved,
        EventName::WorldEventProcessed,
        EventName::WorldEventDuplicate,
        EventName::WorldEventDeadLettered,
        EventName::WorldClockAdvanced,
        EventName::WorldAreaGenerationRequested,
        EventName::LocationClockInitialized,
        EventName::LocationClockSynced,
        EventName::LocationClockBatchSynced,
        EventName::DescriptionGenerateStart,
        EventName::DescriptionGenerateSuccess,
        EventName::DescriptionGenerateFailure,
        EventName::DescriptionCacheHit,
        EventName::DescriptionCacheMiss,
        EventName::DescriptionIntegrityJobStart,
        EventName::DescriptionIntegrityJobComplete,
        EventName::DescriptionIntegrityComputed,
        EventName::DescriptionIntegrityUnchanged,
        EventName::DescriptionIntegrityMismatch,
        EventName::AiCostEstimated,
        EventName::AiCostWindowSummary,
        EventName::AiCostSoftThresholdCrossed,
        EventName::TelemetryEventNameInvalid,
    ];

    /// Parses a dotted event name string, falling back to
    /// `TelemetryEventNameInvalid` rather than propagating the mistyped
    /// name to a sink under its own spelling.
    pub fn parse_or_invalid(raw: &str) -> EventName {
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str() == raw)
            .unwrap_or(EventName::TelemetryEventNameInvalid)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_registry_entry_round_trips() {
        for event in EventName::ALL {
            assert_eq!(EventName::parse_or_invalid(event.as_str()), *event);
        }
    }

    #[test]
    fn unknown_name_falls_back_to_invalid() {
        assert_eq!(
            EventName::parse_or_invalid("Playerr.Gett"),
            EventName::TelemetryEventNameInvalid
        );
    }
}
