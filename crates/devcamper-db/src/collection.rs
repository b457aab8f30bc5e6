use std::fmt;

/// The named document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Bootcamps,
    Courses,
    Reviews,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Users,
        Collection::Bootcamps,
        Collection::Courses,
        Collection::Reviews,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Bootcamps => "bootcamps",
            Self::Courses => "courses",
            Self::Reviews => "reviews",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Top-level fields whose values must be unique within the collection.
    pub fn unique_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Users => &["email"],
            Self::Bootcamps => &["name"],
            Self::Courses | Self::Reviews => &[],
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
