//! The authenticated caller behind a request.

use crate::types::DbId;

/// Who made a request.
///
/// Interactive users may edit anything; the automation caller loses write
/// access to a submission once a person has edited it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Interactive(InteractiveUser),
    Service,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractiveUser {
    pub id: UserRef,
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_admin: bool,
}

/// Where an interactive user's identity comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    /// Row in the local `users` table.
    Local(DbId),
    /// Object id asserted by the identity provider; not stored locally.
    Federated(String),
}

impl Identity {
    pub fn is_service(&self) -> bool {
        matches!(self, Identity::Service)
    }

    /// Whether this caller may overwrite a submission a person has locked.
    pub fn may_overwrite_locked(&self) -> bool {
        match self {
            Identity::Interactive(_) => true,
            Identity::Service => false,
        }
    }

    /// Short label for log fields.
    pub fn log_label(&self) -> String {
        match self {
            Identity::Interactive(user) => match &user.id {
                UserRef::Local(id) => format!("user:{id}"),
                UserRef::Federated(oid) => format!("federated:{oid}"),
            },
            Identity::Service => "service".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Identity {
        Identity::Interactive(InteractiveUser {
            id: UserRef::Local(7),
            name: Some("Dana".into()),
            email: Some("dana@example.com".into()),
            is_admin: false,
        })
    }

    #[test]
    fn only_people_override_locks() {
        assert!(person().may_overwrite_locked());
        assert!(!Identity::Service.may_overwrite_locked());
    }

    #[test]
    fn log_labels() {
        assert_eq!(person().log_label(), "user:7");
        assert_eq!(Identity::Service.log_label(), "service");
        let federated = Identity::Interactive(InteractiveUser {
            id: UserRef::Federated("abc".into()),
            name: None,
            email: None,
            is_admin: false,
        });
        assert_eq!(federated.log_label(), "federated:abc");
    }
}
