//! Declarative shapes for the stored documents
//!
//! A [`Shape`] lists the fields of a document together with the constraints
//! the store enforces at write time. Shapes are plain `static` data: declaring
//! them performs no I/O and cannot fail.

/// Storage type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    DateTime,
    Boolean,
    /// Ordered sequence of embedded documents of the given shape
    Array(&'static Shape),
}

/// Value applied when a field is absent at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    None,
    Bool(bool),
    /// Current time at creation
    Now,
    EmptyArray,
}

/// Regular expression a string field must match, with the message reported
/// when it does not
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRule {
    pub pattern: &'static str,
    pub message: &'static str,
}

/// A single field declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub field_type: FieldType,
    /// `Some(message)` when the field is required
    pub required: Option<&'static str>,
    pub unique: bool,
    pub trim: bool,
    pub matches: Option<MatchRule>,
    pub default: DefaultValue,
}

impl Field {
    const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: None,
            unique: false,
            trim: false,
            matches: None,
            default: DefaultValue::None,
        }
    }

    const fn required(mut self, message: &'static str) -> Self {
        self.required = Some(message);
        self
    }

    const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    const fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    const fn matches(mut self, pattern: &'static str, message: &'static str) -> Self {
        self.matches = Some(MatchRule { pattern, message });
        self
    }

    const fn default(mut self, default: DefaultValue) -> Self {
        self.default = default;
        self
    }

    pub fn is_required(&self) -> bool {
        self.required.is_some()
    }
}

/// A document shape
#[derive(Debug, PartialEq, Eq)]
pub struct Shape {
    pub name: &'static str,
    pub fields: &'static [Field],
}

impl Shape {
    /// Look up a field by its stored name
    pub fn field(&self, name: &str) -> Option<&'static Field> {
        let fields: &'static [Field] = self.fields;
        fields.iter().find(|field| field.name == name)
    }

    /// Message reported when a required field is missing.
    ///
    /// Returns `None` for unknown or optional fields.
    pub fn required_message(&self, name: &str) -> Option<&'static str> {
        self.field(name).and_then(|field| field.required)
    }

    /// Fields backed by a unique index, in declaration order
    pub fn unique_fields(&self) -> impl Iterator<Item = &'static Field> + use<> {
        let fields: &'static [Field] = self.fields;
        fields.iter().filter(|field| field.unique)
    }
}

/// Email pattern: something, `@`, something, `.`, something
pub const EMAIL_PATTERN: &str = r".+@.+\..+";

pub static MESSAGE_SHAPE: Shape = Shape {
    name: "Message",
    fields: &[
        Field::new("content", FieldType::String).required("Path `content` is required."),
        Field::new("createdAt", FieldType::DateTime)
            .required("Path `createdAt` is required.")
            .default(DefaultValue::Now),
    ],
};

pub static USER_SHAPE: Shape = Shape {
    name: "User",
    fields: &[
        Field::new("username", FieldType::String)
            .required("Username is required")
            .trim()
            .unique(),
        Field::new("email", FieldType::String)
            .required("Email is required")
            .unique()
            .matches(EMAIL_PATTERN, "Please fill a valid email address"),
        Field::new("password", FieldType::String).required("Password is required"),
        Field::new("verifyCode", FieldType::String).required("Verification code is required"),
        Field::new("verifyCodeExpiry", FieldType::DateTime)
            .required("Verification code expiry is required"),
        Field::new("isVerified", FieldType::Boolean).default(DefaultValue::Bool(false)),
        Field::new("isAcceptingMessage", FieldType::Boolean).default(DefaultValue::Bool(true)),
        Field::new("messages", FieldType::Array(&MESSAGE_SHAPE)).default(DefaultValue::EmptyArray),
    ],
};
