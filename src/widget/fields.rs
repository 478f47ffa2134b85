use crate::types::Subject;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Select {
        options: &'static [&'static str],
        default: &'static str,
    },
}

/// Static description of one input, the equivalent of its markup attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

pub const SEVERITY_LEVELS: &[&str] = &["Low", "Normal", "High", "Urgent"];

const SALES_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "name",
        label: "Full name",
        kind: FieldKind::Text,
        required: true,
    },
    FieldSpec {
        name: "email",
        label: "Work email",
        kind: FieldKind::Email,
        required: true,
    },
    FieldSpec {
        name: "message",
        label: "How can we help?",
        kind: FieldKind::Text,
        required: true,
    },
    FieldSpec {
        name: "company",
        label: "Company",
        kind: FieldKind::Text,
        required: true,
    },
    FieldSpec {
        name: "role",
        label: "Role",
        kind: FieldKind::Text,
        required: true,
    },
];

const SUPPORT_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "name",
        label: "Full name",
        kind: FieldKind::Text,
        required: true,
    },
    FieldSpec {
        name: "email",
        label: "Email",
        kind: FieldKind::Email,
        required: true,
    },
    FieldSpec {
        name: "message",
        label: "Describe the issue",
        kind: FieldKind::Text,
        required: true,
    },
    FieldSpec {
        name: "hostUrl",
        label: "Host URL",
        kind: FieldKind::Text,
        required: false,
    },
    FieldSpec {
        name: "severity",
        label: "Severity",
        kind: FieldKind::Select {
            options: SEVERITY_LEVELS,
            default: "Normal",
        },
        required: true,
    },
];

/// Which form a widget renders. Each variant owns its field layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Sales,
    Support,
}

impl FormMode {
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            FormMode::Sales => SALES_FIELDS,
            FormMode::Support => SUPPORT_FIELDS,
        }
    }

    pub fn subject(self) -> Subject {
        match self {
            FormMode::Sales => Subject::Sales,
            FormMode::Support => Subject::Support,
        }
    }
}

/// A mounted input: its spec plus live value and error flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    spec: &'static FieldSpec,
    value: String,
    has_error: bool,
}

impl Field {
    pub fn mount(spec: &'static FieldSpec) -> Self {
        let value = match spec.kind {
            FieldKind::Select { default, .. } => default.to_string(),
            _ => String::new(),
        };
        Self {
            spec,
            value,
            has_error: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn spec(&self) -> &'static FieldSpec {
        self.spec
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn is_select(&self) -> bool {
        matches!(self.spec.kind, FieldKind::Select { .. })
    }

    pub fn is_email(&self) -> bool {
        self.spec.kind == FieldKind::Email
    }

    pub(crate) fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub(crate) fn set_error(&mut self, has_error: bool) {
        self.has_error = has_error;
    }
}
