// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::model::{Column, normalize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Status,
    Priority,
    Samples,
    NeededBy,
    Timestamp,
}

impl Role {
    pub const ALL: [Self; 5] = [
        Self::Status,
        Self::Priority,
        Self::Samples,
        Self::NeededBy,
        Self::Timestamp,
    ];

    pub const fn default_label(self) -> &'static str {
        match self {
            Self::Status => "STATUS",
            Self::Priority => "PRIORITY",
            Self::Samples => "SAMPLES",
            Self::NeededBy => "NEEDED BY",
            Self::Timestamp => "TIMESTAMP",
        }
    }
}

/// Header labels that identify each role. Compared after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleLabels {
    pub status: String,
    pub priority: String,
    pub samples: String,
    pub needed_by: String,
    pub timestamp: String,
}

impl Default for RoleLabels {
    fn default() -> Self {
        Self {
            status: Role::Status.default_label().to_owned(),
            priority: Role::Priority.default_label().to_owned(),
            samples: Role::Samples.default_label().to_owned(),
            needed_by: Role::NeededBy.default_label().to_owned(),
            timestamp: Role::Timestamp.default_label().to_owned(),
        }
    }
}

impl RoleLabels {
    pub fn label(&self, role: Role) -> &str {
        match role {
            Role::Status => &self.status,
            Role::Priority => &self.priority,
            Role::Samples => &self.samples,
            Role::NeededBy => &self.needed_by,
            Role::Timestamp => &self.timestamp,
        }
    }
}

/// Normalized header label to column position, rebuilt on every fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoleMap {
    indices: BTreeMap<String, usize>,
    column_count: usize,
}

pub fn resolve_columns(columns: &[Column]) -> RoleMap {
    let mut indices = BTreeMap::new();
    for (index, column) in columns.iter().enumerate() {
        let key = column.normalized_label();
        if key.is_empty() {
            continue;
        }
        indices.insert(key, index);
    }
    RoleMap {
        indices,
        column_count: columns.len(),
    }
}

impl RoleMap {
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.indices.get(&normalize(label)).copied()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn roles(&self, labels: &RoleLabels) -> ResolvedRoles {
        let timestamp = self
            .index_of(&labels.timestamp)
            .or_else(|| (self.column_count > 0).then_some(0));
        let needed_by = self
            .index_of(&labels.needed_by)
            .or_else(|| self.first_containing(&labels.needed_by));

        ResolvedRoles {
            status: self.index_of(&labels.status),
            priority: self.index_of(&labels.priority),
            samples: self.index_of(&labels.samples),
            needed_by,
            timestamp,
        }
    }

    fn first_containing(&self, label: &str) -> Option<usize> {
        let needle = normalize(label);
        if needle.is_empty() {
            return None;
        }
        self.indices
            .iter()
            .filter(|(key, _)| key.contains(&needle))
            .map(|(_, index)| *index)
            .min()
    }
}

/// Column position per role for one table; `None` disables that role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolvedRoles {
    pub status: Option<usize>,
    pub priority: Option<usize>,
    pub samples: Option<usize>,
    pub needed_by: Option<usize>,
    pub timestamp: Option<usize>,
}

impl ResolvedRoles {
    pub const fn get(&self, role: Role) -> Option<usize> {
        match role {
            Role::Status => self.status,
            Role::Priority => self.priority,
            Role::Samples => self.samples,
            Role::NeededBy => self.needed_by,
            Role::Timestamp => self.timestamp,
        }
    }
}
