//! Provisioning-request property bag and lifecycle planning.

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use synth::SecretArn;

/// Property bag handed to the execution engine.
///
/// The read-only key is omitted entirely when no read-only user was
/// requested; the handler distinguishes "nothing to do" from an explicit
/// empty value by key absence. `version` carries the handler's version
/// token verbatim and is the sole signal that forces re-invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestProperties {
    pub conn_secret_arn: SecretArn,
    pub new_user_secret_arn: SecretArn,
    pub read_only_user_secret_arn: Option<SecretArn>,
    pub version: String,
}

impl RequestProperties {
    /// Wire form of the bag.
    pub fn to_value(&self) -> Value {
        let mut bag = Map::new();
        bag.insert(
            "conn_secret_arn".to_string(),
            Value::String(self.conn_secret_arn.as_str().to_string()),
        );
        bag.insert(
            "new_user_secret_arn".to_string(),
            Value::String(self.new_user_secret_arn.as_str().to_string()),
        );
        if let Some(read_only) = &self.read_only_user_secret_arn {
            bag.insert(
                "read_only_user_secret_arn".to_string(),
                Value::String(read_only.as_str().to_string()),
            );
        }
        bag.insert("version".to_string(), Value::String(self.version.clone()));
        Value::Object(bag)
    }
}

/// Lifecycle event the execution engine dispatches for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Create,
    Update,
    Delete,
}

/// Decide which lifecycle event a change to the request calls for.
///
/// An unchanged bag plans no event: the engine treats the request as
/// stable and the handler is not re-invoked. Only `version` may change on
/// a registered request; the handler's behavior for any other change is
/// undefined upstream, so such changes are refused instead of guessed at.
pub fn plan_change(
    previous: Option<&RequestProperties>,
    next: Option<&RequestProperties>,
) -> Result<Option<LifecycleEvent>> {
    match (previous, next) {
        (None, None) => Ok(None),
        (None, Some(_)) => Ok(Some(LifecycleEvent::Create)),
        (Some(_), None) => Ok(Some(LifecycleEvent::Delete)),
        (Some(previous), Some(next)) => {
            if let Some(field) = changed_field(previous, next) {
                return Err(Error::UnsupportedPropertyChange { field });
            }
            if previous.version != next.version {
                Ok(Some(LifecycleEvent::Update))
            } else {
                Ok(None)
            }
        }
    }
}

fn changed_field(previous: &RequestProperties, next: &RequestProperties) -> Option<&'static str> {
    if previous.conn_secret_arn != next.conn_secret_arn {
        return Some("conn_secret_arn");
    }
    if previous.new_user_secret_arn != next.new_user_secret_arn {
        return Some("new_user_secret_arn");
    }
    if previous.read_only_user_secret_arn != next.read_only_user_secret_arn {
        return Some("read_only_user_secret_arn");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(version: &str) -> RequestProperties {
        RequestProperties {
            conn_secret_arn: SecretArn::new("myapp/db/admin"),
            new_user_secret_arn: SecretArn::new("myapp/db/user"),
            read_only_user_secret_arn: None,
            version: version.to_string(),
        }
    }

    #[test]
    fn test_read_only_key_is_absent_when_not_requested() {
        let bag = request("v1").to_value();
        let keys: Vec<&str> = bag.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["conn_secret_arn", "new_user_secret_arn", "version"]);
    }

    #[test]
    fn test_read_only_key_is_present_when_requested() {
        let mut props = request("v1");
        props.read_only_user_secret_arn = Some(SecretArn::new("myapp/db/reader"));
        let bag = props.to_value();
        assert_eq!(bag["read_only_user_secret_arn"], "secret://myapp/db/reader");
    }

    #[test]
    fn test_first_registration_plans_create() {
        assert_eq!(
            plan_change(None, Some(&request("v1"))).unwrap(),
            Some(LifecycleEvent::Create)
        );
    }

    #[test]
    fn test_unchanged_request_plans_nothing() {
        assert_eq!(plan_change(Some(&request("v1")), Some(&request("v1"))).unwrap(), None);
    }

    #[test]
    fn test_version_change_plans_update() {
        assert_eq!(
            plan_change(Some(&request("v1")), Some(&request("v2"))).unwrap(),
            Some(LifecycleEvent::Update)
        );
    }

    #[test]
    fn test_removal_plans_delete() {
        assert_eq!(
            plan_change(Some(&request("v1")), None).unwrap(),
            Some(LifecycleEvent::Delete)
        );
    }

    #[test]
    fn test_non_version_change_is_refused() {
        let previous = request("v1");
        let mut next = request("v2");
        next.new_user_secret_arn = SecretArn::new("myapp/db/other-user");

        let err = plan_change(Some(&previous), Some(&next)).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedPropertyChange { field: "new_user_secret_arn" }
        ));
    }
}
