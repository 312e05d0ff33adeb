//! Per-viewer projections of directory records.

use lumina_shared::{Actor, Record, Subscription};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::engine::Directory;
use crate::error::Result;

/// The "my listings" page for whoever is signed in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum OwnerView {
    SignedOut,
    SignedIn { actor: Actor, records: Vec<Record> },
}

impl OwnerView {
    pub fn records(&self) -> &[Record] {
        match self {
            Self::SignedOut => &[],
            Self::SignedIn { records, .. } => records,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }
}

impl Directory {
    pub fn view_for(&self, actor: Option<&Actor>) -> Result<OwnerView> {
        match actor {
            None => Ok(OwnerView::SignedOut),
            Some(actor) => Ok(OwnerView::SignedIn {
                actor: actor.clone(),
                records: self.list_for_owner(actor)?,
            }),
        }
    }
}

/// Wait for the next sign-in or sign-out and rebuild the view for the new
/// actor. `None` once the identity provider is gone.
pub async fn next_view(
    directory: &Mutex<Directory>,
    subscription: &mut Subscription,
) -> Option<Result<OwnerView>> {
    let actor = subscription.changed().await?;
    let directory = directory.lock().await;
    Some(directory.view_for(actor.as_ref()))
}

/// `record` as `viewer` may see it: a hidden phone number is only shown to
/// the owner.
pub fn redact_for(mut record: Record, viewer: Option<&Actor>) -> Record {
    let is_owner = viewer.is_some_and(|actor| record.is_owned_by(actor));
    if record.contact.hide_phone && !is_owner {
        record.contact.phone = None;
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationPolicy;
    use lumina_shared::{IdentityProvider, RecordKind, Session};
    use lumina_store::{Database, TableStore};

    fn directory() -> Directory {
        Directory::new(
            RecordKind::Venue,
            Box::new(TableStore::new(Database::open_in_memory().unwrap(), RecordKind::Venue)),
        )
        .with_policy(ValidationPolicy::Lenient)
    }

    #[test]
    fn signed_out_view_is_empty() {
        let view = directory().view_for(None).unwrap();
        assert!(!view.is_signed_in());
        assert!(view.records().is_empty());
    }

    #[test]
    fn hidden_phone_only_for_owner() {
        let owner = Actor::new("u1");
        let mut record = Record::named("Niceto");
        record.stamp_owner(&owner);
        record.contact.phone = Some("+54 11 5555".into());
        record.contact.hide_phone = true;

        assert_eq!(redact_for(record.clone(), None).contact.phone, None);
        assert_eq!(redact_for(record.clone(), Some(&Actor::new("u2"))).contact.phone, None);
        assert!(redact_for(record.clone(), Some(&owner)).contact.phone.is_some());

        record.contact.hide_phone = false;
        assert!(redact_for(record, None).contact.phone.is_some());
    }

    #[tokio::test]
    async fn view_follows_identity_changes() {
        let session = Session::new();
        let directory = Mutex::new(directory());
        let mut subscription = session.subscribe();

        let actor = session.login("ana@example.com", Some("Ana")).unwrap();
        directory
            .lock()
            .await
            .create(&actor, Record::named("Niceto"))
            .unwrap();

        let view = next_view(&directory, &mut subscription).await.unwrap().unwrap();
        assert!(view.is_signed_in());
        assert_eq!(view.records().len(), 1);

        session.logout().unwrap();
        let view = next_view(&directory, &mut subscription).await.unwrap().unwrap();
        assert_eq!(view, OwnerView::SignedOut);
    }
}
