use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    UnitResolved { unit: String, members: usize, combined: bool },
    NameCollision { name: String },
    ClipSaved { unit: String, path: String },
    MotionMissing { unit: String, state: String, path: String },
    ControllerSaved { path: String, layers: usize },
    TemplateCopied { folder: String },
    TemplateReused { folder: String },
    DocumentsReconciled { controls: usize, parameters: usize },
    DescriptorSaved { path: String },
}

impl GenerationEvent {
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            GenerationEvent::NameCollision { .. }
                | GenerationEvent::MotionMissing { .. }
                | GenerationEvent::TemplateReused { .. }
        )
    }
}

impl fmt::Display for GenerationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationEvent::UnitResolved { unit, members, combined } => {
                let kind = if *combined { "combined" } else { "individual" };
                write!(f, "UnitResolved unit={unit} kind={kind} members={members}")
            }
            GenerationEvent::NameCollision { name } => write!(f, "NameCollision name={name}"),
            GenerationEvent::ClipSaved { unit, path } => write!(f, "ClipSaved unit={unit} path={path}"),
            GenerationEvent::MotionMissing { unit, state, path } => {
                write!(f, "MotionMissing unit={unit} state={state} path={path}")
            }
            GenerationEvent::ControllerSaved { path, layers } => {
                write!(f, "ControllerSaved path={path} layers={layers}")
            }
            GenerationEvent::TemplateCopied { folder } => write!(f, "TemplateCopied folder={folder}"),
            GenerationEvent::TemplateReused { folder } => write!(f, "TemplateReused folder={folder}"),
            GenerationEvent::DocumentsReconciled { controls, parameters } => {
                write!(f, "DocumentsReconciled controls={controls} parameters={parameters}")
            }
            GenerationEvent::DescriptorSaved { path } => write!(f, "DescriptorSaved path={path}"),
        }
    }
}

#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<GenerationEvent>,
}

impl EventLog {
    pub fn push(&mut self, event: GenerationEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[GenerationEvent] {
        &self.events
    }

    pub fn warnings(&self) -> impl Iterator<Item = &GenerationEvent> {
        self.events.iter().filter(|event| event.is_warning())
    }

    pub fn drain(&mut self) -> Vec<GenerationEvent> {
        self.events.drain(..).collect()
    }
}
