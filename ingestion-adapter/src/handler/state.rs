use common::error::AppError;
use state_machines::state_machine;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum HandlerPhase {
    #[default]
    Created,
    Running,
    Paused,
    Indexed,
    Failed,
    Stopped,
}

impl HandlerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerPhase::Created => "Created",
            HandlerPhase::Running => "Running",
            HandlerPhase::Paused => "Paused",
            HandlerPhase::Indexed => "Indexed",
            HandlerPhase::Failed => "Failed",
            HandlerPhase::Stopped => "Stopped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            HandlerPhase::Indexed | HandlerPhase::Failed | HandlerPhase::Stopped
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTransition {
    Start,
    Pause,
    Resume,
    Complete,
    Fail,
    Stop,
}

impl PhaseTransition {
    fn as_str(&self) -> &'static str {
        match self {
            PhaseTransition::Start => "start",
            PhaseTransition::Pause => "pause",
            PhaseTransition::Resume => "resume",
            PhaseTransition::Complete => "complete",
            PhaseTransition::Fail => "fail",
            PhaseTransition::Stop => "stop",
        }
    }
}

mod lifecycle {
    use super::state_machine;

    state_machine! {
        name: HandlerLifecycleMachine,
        initial: Created,
        states: [Created, Running, Paused, Indexed, Failed, Stopped],
        events {
            start {
                transition: { from: Created, to: Running }
            }
            pause {
                transition: { from: Running, to: Paused }
            }
            resume {
                transition: { from: Paused, to: Running }
            }
            complete {
                transition: { from: Running, to: Indexed }
            }
            fail {
                transition: { from: Running, to: Failed }
            }
            stop {
                transition: { from: Created, to: Stopped }
                transition: { from: Running, to: Stopped }
                transition: { from: Paused, to: Stopped }
            }
        }
    }

    pub(super) fn created() -> HandlerLifecycleMachine<(), Created> {
        HandlerLifecycleMachine::new(())
    }

    pub(super) fn running() -> HandlerLifecycleMachine<(), Running> {
        created()
            .start()
            .expect("start transition from Created should exist")
    }

    pub(super) fn paused() -> HandlerLifecycleMachine<(), Paused> {
        running()
            .pause()
            .expect("pause transition from Running should exist")
    }
}

fn invalid_transition(phase: HandlerPhase, event: PhaseTransition) -> AppError {
    AppError::Transition(format!("{} -> {}", phase.as_str(), event.as_str()))
}

pub fn compute_next_phase(
    phase: HandlerPhase,
    event: PhaseTransition,
) -> Result<HandlerPhase, AppError> {
    use lifecycle::*;
    match (phase, event) {
        (HandlerPhase::Created, PhaseTransition::Start) => created()
            .start()
            .map(|_| HandlerPhase::Running)
            .map_err(|_| invalid_transition(phase, event)),
        (HandlerPhase::Running, PhaseTransition::Pause) => running()
            .pause()
            .map(|_| HandlerPhase::Paused)
            .map_err(|_| invalid_transition(phase, event)),
        (HandlerPhase::Paused, PhaseTransition::Resume) => paused()
            .resume()
            .map(|_| HandlerPhase::Running)
            .map_err(|_| invalid_transition(phase, event)),
        (HandlerPhase::Running, PhaseTransition::Complete) => running()
            .complete()
            .map(|_| HandlerPhase::Indexed)
            .map_err(|_| invalid_transition(phase, event)),
        (HandlerPhase::Running, PhaseTransition::Fail) => running()
            .fail()
            .map(|_| HandlerPhase::Failed)
            .map_err(|_| invalid_transition(phase, event)),
        (HandlerPhase::Created, PhaseTransition::Stop) => created()
            .stop()
            .map(|_| HandlerPhase::Stopped)
            .map_err(|_| invalid_transition(phase, event)),
        (HandlerPhase::Running, PhaseTransition::Stop) => running()
            .stop()
            .map(|_| HandlerPhase::Stopped)
            .map_err(|_| invalid_transition(phase, event)),
        (HandlerPhase::Paused, PhaseTransition::Stop) => paused()
            .stop()
            .map(|_| HandlerPhase::Stopped)
            .map_err(|_| invalid_transition(phase, event)),
        _ => Err(invalid_transition(phase, event)),
    }
}
