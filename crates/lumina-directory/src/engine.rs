//! The record directory: one engine per collection.

use lumina_shared::constants::DEFAULT_MAX_PHOTO_DIMENSION;
use lumina_shared::{photo, Actor, InlineImage, Record, RecordId, RecordKind, RecordPatch};
use lumina_store::RecordStore;
use serde::Serialize;
use serde_json::Value;

use crate::dedup::unique_by_logical_id;
use crate::error::{DirectoryError, FieldIssue, Result, ValidationError};
use crate::map::{map_markers, MapFilter, Marker};
use crate::search::{facets, search, Facets, SearchFilter};
use crate::validation::ValidationPolicy;

/// Which records a listing covers.
#[derive(Debug, Clone, Copy)]
pub enum QueryMode<'a> {
    /// Records owned by this actor.
    Owned(&'a Actor),
    /// Everything, read-only.
    Browse,
}

/// Explicit answer to "delete this listing?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Self::Confirmed
        } else {
            Self::Declined
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Removal {
    Deleted,
    Cancelled,
}

/// Non-fatal problem reported alongside a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum SubmitWarning {
    /// The uploaded photo could not be read and was left out.
    PhotoDropped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub record: Record,
    pub warnings: Vec<SubmitWarning>,
}

/// CRUD, dedup and ownership rules over one collection.
///
/// Reads merge the primary store with any legacy sources; writes only ever
/// reach the primary store.
pub struct Directory {
    kind: RecordKind,
    primary: Box<dyn RecordStore>,
    legacy: Vec<Box<dyn RecordStore>>,
    policy: ValidationPolicy,
    max_photo_dimension: u32,
}

impl Directory {
    pub fn new(kind: RecordKind, primary: Box<dyn RecordStore>) -> Self {
        Self {
            kind,
            primary,
            legacy: Vec::new(),
            policy: ValidationPolicy::default(),
            max_photo_dimension: DEFAULT_MAX_PHOTO_DIMENSION,
        }
    }

    /// Also read from `source`. Records found only there are visible but
    /// cannot be changed.
    pub fn with_legacy_source(mut self, source: Box<dyn RecordStore>) -> Self {
        self.legacy.push(source);
        self
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_photo_dimension(mut self, max: u32) -> Self {
        self.max_photo_dimension = max;
        self
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    pub fn max_photo_dimension(&self) -> u32 {
        self.max_photo_dimension
    }

    fn store_err(&self, e: lumina_store::StoreError) -> DirectoryError {
        DirectoryError::from_store(self.kind, e)
    }

    /// Primary then legacy sources, deduplicated. A failing legacy source is
    /// skipped; a failing primary store is an error.
    fn gather<F>(&self, read: F) -> Result<Vec<Record>>
    where
        F: Fn(&dyn RecordStore) -> lumina_store::Result<Vec<Record>>,
    {
        let mut records = read(self.primary.as_ref()).map_err(|e| self.store_err(e))?;

        for source in &self.legacy {
            match read(source.as_ref()) {
                Ok(more) => records.extend(more),
                Err(e) => tracing::warn!(
                    kind = %self.kind,
                    source = %source.describe(),
                    error = %e,
                    "legacy source unreadable, skipping"
                ),
            }
        }

        Ok(unique_by_logical_id(records))
    }

    fn scan(&self) -> Result<Vec<Record>> {
        self.gather(|store| store.list_all())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Owned listings ask each store for the actor's records, so the table
    /// backend filters on its owner column.
    pub fn list(&self, mode: QueryMode<'_>) -> Result<Vec<Record>> {
        match mode {
            QueryMode::Browse => self.scan(),
            QueryMode::Owned(actor) => self.gather(|store| store.list_by_owner(actor)),
        }
    }

    pub fn list_for_owner(&self, actor: &Actor) -> Result<Vec<Record>> {
        self.list(QueryMode::Owned(actor))
    }

    pub fn browse(&self) -> Result<Vec<Record>> {
        self.list(QueryMode::Browse)
    }

    pub fn get(&self, id: &RecordId) -> Result<Record> {
        self.scan()?
            .into_iter()
            .find(|record| record.id.as_ref() == Some(id))
            .ok_or_else(|| DirectoryError::NotFound {
                kind: self.kind,
                id: id.clone(),
            })
    }

    /// Browse then filter.
    pub fn search(&self, filter: &SearchFilter) -> Result<Vec<Record>> {
        Ok(search(self.browse()?, filter))
    }

    pub fn facets(&self) -> Result<Facets> {
        Ok(facets(&self.browse()?))
    }

    pub fn map_markers(&self, filter: &MapFilter) -> Result<Vec<Marker>> {
        Ok(map_markers(&self.browse()?, filter))
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// A stored record from the primary store that `actor` owns.
    fn owned(&self, actor: &Actor, id: &RecordId) -> Result<Record> {
        let record = self.primary.get(id).map_err(|e| self.store_err(e))?;
        if !record.is_owned_by(actor) {
            tracing::warn!(kind = %self.kind, id = %id, actor = %actor.id, "ownership check failed");
            return Err(DirectoryError::Ownership {
                kind: self.kind,
                id: id.clone(),
                actor: actor.id.clone(),
            });
        }
        Ok(record)
    }

    /// Fails unless `actor` may change `id`. Lets callers refuse work up
    /// front, before anything expensive happens.
    pub fn ensure_owner(&self, actor: &Actor, id: &RecordId) -> Result<()> {
        self.owned(actor, id).map(|_| ())
    }

    /// Validate `draft`, stamp `actor` as owner and persist it.
    ///
    /// A draft carrying an id the actor already owns is a retry and returns
    /// the stored record unchanged.
    pub fn create(&self, actor: &Actor, mut draft: Record) -> Result<Record> {
        let has_id = !actor.id.as_str().trim().is_empty();
        let has_email = actor.email.as_deref().is_some_and(|e| !e.trim().is_empty());
        if !has_id && !has_email {
            return Err(ValidationError::single(FieldIssue::missing("ownerId")).into());
        }

        if let Some(id) = draft.id.clone().filter(|id| !id.is_blank()) {
            match self.primary.get(&id) {
                Ok(existing) if existing.is_owned_by(actor) => {
                    tracing::debug!(kind = %self.kind, id = %id, "create retried, returning stored record");
                    return Ok(existing);
                }
                Ok(_) => {
                    return Err(ValidationError::single(FieldIssue::invalid(
                        "id",
                        format!("{id} is already taken"),
                    ))
                    .into())
                }
                Err(lumina_store::StoreError::NotFound(_)) => {}
                Err(e) => return Err(self.store_err(e)),
            }
        }

        draft.name = draft.name.trim().to_string();
        // Both owner fields always come from the actor, never the draft.
        draft.owner_id = has_id.then(|| actor.id.clone());
        draft.owner_email = actor.email.clone().filter(|e| !e.trim().is_empty());

        self.policy.check(self.kind, &draft)?;

        let id = match draft.id.clone().filter(|id| !id.is_blank()) {
            Some(id) => id,
            None => RecordId::generate(),
        };
        draft.id = Some(id.clone());

        self.primary
            .insert(draft.clone())
            .map_err(|e| self.store_err(e))?;

        tracing::info!(kind = %self.kind, id = %id, actor = %actor.id, "record created");
        Ok(draft)
    }

    /// Create with an optional photo upload. An unreadable photo is left out
    /// and reported as a warning; the rest is still saved.
    pub fn submit(&self, actor: &Actor, mut draft: Record, upload: Option<&[u8]>) -> Result<Submission> {
        let mut warnings = Vec::new();

        if let Some(bytes) = upload {
            match photo::encode(bytes, self.max_photo_dimension) {
                Ok(image) => draft.photo = Some(image.data_url),
                Err(e) => {
                    tracing::warn!(kind = %self.kind, error = %e, "dropping unreadable photo");
                    warnings.push(SubmitWarning::PhotoDropped {
                        reason: e.to_string(),
                    });
                }
            }
        }

        let record = self.create(actor, draft)?;
        Ok(Submission { record, warnings })
    }

    /// Shallow-merge `patch` over an owned record.
    pub fn update(&self, actor: &Actor, id: &RecordId, patch: &RecordPatch) -> Result<Record> {
        let current = self.owned(actor, id)?;

        let merged = patch.apply_to(&current).map_err(ValidationError::from)?;
        self.policy.check(self.kind, &merged)?;

        let updated = self
            .primary
            .update_by_id(id, patch)
            .map_err(|e| self.store_err(e))?;

        tracing::info!(
            kind = %self.kind,
            id = %id,
            fields = ?patch.keys().collect::<Vec<_>>(),
            "record updated"
        );
        Ok(updated)
    }

    /// Store an already encoded photo.
    pub fn set_photo(&self, actor: &Actor, id: &RecordId, image: &InlineImage) -> Result<Record> {
        let patch = RecordPatch::new().set("photo", image.data_url.clone());
        self.update(actor, id, &patch)
    }

    /// Encode `bytes` and store the result. Nothing changes when the image
    /// cannot be decoded.
    pub fn attach_photo(&self, actor: &Actor, id: &RecordId, bytes: &[u8]) -> Result<Record> {
        self.ensure_owner(actor, id)?;
        let image = photo::encode(bytes, self.max_photo_dimension)?;
        self.set_photo(actor, id, &image)
    }

    /// Record that an artist played `venue_id`. Dangling venue ids are
    /// accepted.
    pub fn link_venue(&self, actor: &Actor, artist_id: &RecordId, venue_id: RecordId) -> Result<Record> {
        if self.kind != RecordKind::Artist {
            return Err(ValidationError::single(FieldIssue::invalid(
                "venuesPlayed",
                format!("{} listings do not play venues", self.kind),
            ))
            .into());
        }

        let current = self.owned(actor, artist_id)?;
        if current.venues_played.contains(&venue_id) {
            return Ok(current);
        }

        let mut venues: Vec<Value> = current
            .venues_played
            .iter()
            .map(|v| Value::String(v.as_str().to_string()))
            .collect();
        venues.push(Value::String(venue_id.as_str().to_string()));

        self.update(actor, artist_id, &RecordPatch::new().set("venuesPlayed", venues))
    }

    /// Delete an owned record once the caller has confirmed.
    pub fn remove(&self, actor: &Actor, id: &RecordId, confirmation: Confirmation) -> Result<Removal> {
        self.owned(actor, id)?;

        if confirmation == Confirmation::Declined {
            tracing::debug!(kind = %self.kind, id = %id, "removal cancelled");
            return Ok(Removal::Cancelled);
        }

        self.primary.delete_by_id(id).map_err(|e| self.store_err(e))?;
        tracing::info!(kind = %self.kind, id = %id, actor = %actor.id, "record deleted");
        Ok(Removal::Deleted)
    }
}

/// The venues in `artist.venuesPlayed` that exist in `venues`, in the
/// artist's order.
pub fn resolve_venues<'a>(artist: &Record, venues: &'a [Record]) -> Vec<&'a Record> {
    artist
        .venues_played
        .iter()
        .filter_map(|id| venues.iter().find(|v| v.id.as_ref() == Some(id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_shared::ActorId;
    use lumina_store::{Database, LocalStore, TableStore};
    use serde_json::json;

    fn u1() -> Actor {
        Actor::new("u1").with_email("ana@example.com")
    }

    fn u2() -> Actor {
        Actor::new("u2").with_email("beto@example.com")
    }

    fn lenient(kind: RecordKind) -> Directory {
        Directory::new(
            kind,
            Box::new(TableStore::new(Database::open_in_memory().unwrap(), kind)),
        )
        .with_policy(ValidationPolicy::Lenient)
    }

    fn complete_artist(name: &str) -> Record {
        let mut record = Record::named(name);
        record.links.set("instagram", "https://instagram.com/x");
        record.contact.email = Some("band@example.com".into());
        record.contact.phone = Some("+54 11 5555".into());
        record
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn create_stamps_owner_and_assigns_id() {
        let dir = lenient(RecordKind::Artist);
        let record = dir.create(&u1(), Record::named("  Los Gatos ")).unwrap();
        assert_eq!(record.name, "Los Gatos");
        assert_eq!(record.owner_id.as_ref().map(|o| o.as_str()), Some("u1"));
        assert_eq!(record.owner_email.as_deref(), Some("ana@example.com"));
        assert!(record.id.is_some());
        assert_eq!(dir.browse().unwrap(), vec![record]);
    }

    #[test]
    fn empty_name_rejected_nothing_persisted() {
        let dir = lenient(RecordKind::Artist);
        let err = dir.create(&u1(), Record::named("")).unwrap_err();
        match err {
            DirectoryError::Validation(v) => assert!(v.fields().any(|f| f == "name")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(dir.browse().unwrap().is_empty());
    }

    #[test]
    fn strict_policy_is_default() {
        let dir = Directory::new(
            RecordKind::Artist,
            Box::new(TableStore::new(Database::open_in_memory().unwrap(), RecordKind::Artist)),
        );
        assert_eq!(dir.policy(), ValidationPolicy::Strict);
        assert!(dir.create(&u1(), Record::named("Los Gatos")).is_err());
        assert!(dir.create(&u1(), complete_artist("Los Gatos")).is_ok());
    }

    #[test]
    fn anonymous_actor_cannot_create() {
        let dir = lenient(RecordKind::Venue);
        let err = dir.create(&Actor::new(""), Record::named("X")).unwrap_err();
        assert!(matches!(err, DirectoryError::Validation(_)));
    }

    #[test]
    fn email_only_actor_overrides_draft_owner() {
        let dir = lenient(RecordKind::Venue);
        let mallory = Actor::new("").with_email("mallory@example.com");
        let victim = Actor::new("victim").with_email("victim@example.com");

        let mut draft = Record::named("Planted");
        draft.owner_id = Some(ActorId::new("victim"));
        let record = dir.create(&mallory, draft).unwrap();

        assert!(record.owner_id.is_none());
        assert_eq!(record.owner_email.as_deref(), Some("mallory@example.com"));
        assert_eq!(dir.list_for_owner(&mallory).unwrap().len(), 1);
        assert!(dir.list_for_owner(&victim).unwrap().is_empty());

        let id = record.id.unwrap();
        assert!(dir
            .update(&mallory, &id, &RecordPatch::new().set("city", "Palermo"))
            .is_ok());
    }

    #[test]
    fn create_retry_with_owned_id_returns_stored() {
        let dir = lenient(RecordKind::Venue);
        let first = dir.create(&u1(), Record::named("Niceto").with_id("v-1")).unwrap();
        let again = dir.create(&u1(), Record::named("Niceto renamed").with_id("v-1")).unwrap();
        assert_eq!(first, again);
        assert_eq!(dir.browse().unwrap().len(), 1);

        let stolen = dir.create(&u2(), Record::named("Mine now").with_id("v-1"));
        assert!(matches!(stolen, Err(DirectoryError::Validation(_))));
    }

    #[test]
    fn non_owner_cannot_remove_or_update() {
        let dir = lenient(RecordKind::Artist);
        let record = dir.create(&u1(), Record::named("Los Gatos")).unwrap();
        let id = record.id.clone().unwrap();

        let err = dir.remove(&u2(), &id, Confirmation::Confirmed).unwrap_err();
        assert!(matches!(err, DirectoryError::Ownership { .. }));

        let err = dir
            .update(&u2(), &id, &RecordPatch::new().set("name", "Hacked"))
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Ownership { .. }));

        assert_eq!(dir.browse().unwrap(), vec![record]);
    }

    #[test]
    fn ownership_checked_before_confirmation() {
        let dir = lenient(RecordKind::Artist);
        let id = dir.create(&u1(), Record::named("Los Gatos")).unwrap().id.unwrap();
        let err = dir.remove(&u2(), &id, Confirmation::Declined).unwrap_err();
        assert!(matches!(err, DirectoryError::Ownership { .. }));
    }

    #[test]
    fn declined_removal_keeps_record() {
        let dir = lenient(RecordKind::Artist);
        let id = dir.create(&u1(), Record::named("Los Gatos")).unwrap().id.unwrap();

        assert_eq!(dir.remove(&u1(), &id, false.into()).unwrap(), Removal::Cancelled);
        assert_eq!(dir.browse().unwrap().len(), 1);

        assert_eq!(dir.remove(&u1(), &id, true.into()).unwrap(), Removal::Deleted);
        assert!(dir.browse().unwrap().is_empty());
        assert!(matches!(
            dir.remove(&u1(), &id, Confirmation::Confirmed),
            Err(DirectoryError::NotFound { .. })
        ));
    }

    #[test]
    fn update_merges_and_revalidates() {
        let dir = Directory::new(
            RecordKind::Artist,
            Box::new(TableStore::new(Database::open_in_memory().unwrap(), RecordKind::Artist)),
        );
        let id = dir.create(&u1(), complete_artist("Los Gatos")).unwrap().id.unwrap();

        let updated = dir
            .update(&u1(), &id, &RecordPatch::new().set("bio", "Rock nacional"))
            .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Rock nacional"));
        assert_eq!(updated.contact.email.as_deref(), Some("band@example.com"));

        // contact is replaced wholesale, dropping the phone
        let err = dir
            .update(&u1(), &id, &RecordPatch::new().set("contact", json!({"email": "x@example.com"})))
            .unwrap_err();
        match err {
            DirectoryError::Validation(v) => assert_eq!(v.fields().collect::<Vec<_>>(), vec!["contact.phone"]),
            other => panic!("unexpected error: {other}"),
        }

        let err = dir
            .update(&u1(), &id, &RecordPatch::new().set("ownerId", "u2"))
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Validation(_)));
        assert_eq!(dir.get(&id).unwrap().owner_id.unwrap().as_str(), "u1");
    }

    #[test]
    fn email_only_records_match_case_insensitively() {
        let dir = lenient(RecordKind::Venue);
        let mut legacy = Record::named("Old Bar").with_id("old");
        legacy.owner_email = Some("ANA@example.com".into());
        dir.primary.insert(legacy).unwrap();
        dir.primary.insert(Record::named("Unowned").with_id("free")).unwrap();

        let mine = dir.list_for_owner(&u1()).unwrap();
        assert_eq!(mine.len(), 1);
        assert!(dir
            .update(&u1(), &"old".into(), &RecordPatch::new().set("city", "Palermo"))
            .is_ok());

        assert!(dir.list_for_owner(&u2()).unwrap().is_empty());
        assert!(matches!(
            dir.remove(&u1(), &"free".into(), Confirmation::Confirmed),
            Err(DirectoryError::Ownership { .. })
        ));
    }

    #[test]
    fn owned_listing_on_table_backend() {
        let dir = lenient(RecordKind::Venue);
        dir.create(&u1(), Record::named("Niceto")).unwrap();
        dir.create(&u2(), Record::named("Vinilo")).unwrap();

        let mut by_email = Record::named("Old Bar").with_id("old");
        by_email.owner_email = Some(" Ana@Example.com ".into());
        dir.primary.insert(by_email).unwrap();
        dir.primary.insert(Record::named("Unowned").with_id("free")).unwrap();

        let names: Vec<String> = dir
            .list(QueryMode::Owned(&u1()))
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Niceto", "Old Bar"]);

        // Blank actors own nothing, not even unowned rows.
        assert!(dir.list_for_owner(&Actor::new("")).unwrap().is_empty());
        assert!(dir
            .list_for_owner(&Actor::new("").with_email(""))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn legacy_sources_merge_and_stay_read_only() {
        let tmp = tempfile::tempdir().unwrap();
        let current = LocalStore::for_kind(tmp.path(), RecordKind::Artist).unwrap();
        let legacy_path = tmp.path().join("artists.json");
        std::fs::write(
            &legacy_path,
            json!([
                {"id": 1, "name": "Los Gatos", "ownerEmail": "ana@example.com"},
                {"id": 2, "name": "Almendra", "ownerEmail": "ana@example.com"}
            ])
            .to_string(),
        )
        .unwrap();
        std::fs::write(
            current.path(),
            json!([{"id": "1", "name": "Los Gatos (new)", "ownerEmail": "ana@example.com"}]).to_string(),
        )
        .unwrap();

        let mut dir = Directory::new(RecordKind::Artist, Box::new(current))
            .with_policy(ValidationPolicy::Lenient);
        for source in LocalStore::legacy_for_kind(tmp.path(), RecordKind::Artist).unwrap() {
            dir = dir.with_legacy_source(Box::new(source));
        }

        let names: Vec<String> = dir.browse().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Los Gatos (new)", "Almendra"]);

        let err = dir
            .update(&u1(), &"2".into(), &RecordPatch::new().set("bio", "x"))
            .unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound { .. }));
    }

    #[test]
    fn submit_drops_unreadable_photo_with_warning() {
        let dir = lenient(RecordKind::Venue);
        let submission = dir
            .submit(&u1(), Record::named("Niceto"), Some(&b"not an image"[..]))
            .unwrap();
        assert!(submission.record.photo.is_none());
        assert_eq!(submission.warnings.len(), 1);
        assert_eq!(dir.browse().unwrap().len(), 1);

        let submission = dir
            .submit(&u1(), Record::named("Vinilo"), Some(png(40, 20).as_slice()))
            .unwrap();
        assert!(submission.warnings.is_empty());
        assert!(submission
            .record
            .photo
            .unwrap()
            .starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn attach_photo_bounds_size_and_keeps_old_on_failure() {
        let dir = lenient(RecordKind::Venue).with_max_photo_dimension(16);
        let id = dir.create(&u1(), Record::named("Niceto")).unwrap().id.unwrap();

        let updated = dir.attach_photo(&u1(), &id, &png(64, 32)).unwrap();
        let stored_photo = updated.photo.clone().unwrap();
        let bytes = InlineImage {
            data_url: stored_photo.clone(),
            width: 0,
            height: 0,
        }
        .jpeg_bytes()
        .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));

        let err = dir.attach_photo(&u1(), &id, b"garbage").unwrap_err();
        assert!(matches!(err, DirectoryError::ImageDecode(_)));
        assert_eq!(dir.get(&id).unwrap().photo.as_deref(), Some(stored_photo.as_str()));

        let err = dir.attach_photo(&u2(), &id, &png(8, 8)).unwrap_err();
        assert!(matches!(err, DirectoryError::Ownership { .. }));
    }

    #[test]
    fn link_and_resolve_venues() {
        let artists = lenient(RecordKind::Artist);
        let venues = lenient(RecordKind::Venue);

        let niceto = venues.create(&u2(), Record::named("Niceto")).unwrap();
        let artist_id = artists.create(&u1(), Record::named("Los Gatos")).unwrap().id.unwrap();

        let niceto_id = niceto.id.clone().unwrap();
        artists.link_venue(&u1(), &artist_id, niceto_id.clone()).unwrap();
        artists.link_venue(&u1(), &artist_id, niceto_id.clone()).unwrap();
        let artist = artists
            .link_venue(&u1(), &artist_id, "gone".into())
            .unwrap();
        assert_eq!(artist.venues_played.len(), 2);

        let all_venues = venues.browse().unwrap();
        let resolved = resolve_venues(&artist, &all_venues);
        assert_eq!(resolved, vec![&niceto]);

        let played = artists.search(&SearchFilter::default().venue(niceto_id)).unwrap();
        assert_eq!(played.len(), 1);

        assert!(venues.link_venue(&u2(), niceto.id.as_ref().unwrap(), "x".into()).is_err());
    }

    #[test]
    fn facets_and_markers_from_browse() {
        let venues = lenient(RecordKind::Venue);
        let mut niceto = Record::named("Niceto").with_city("Palermo").with_genres(["Rock"]);
        niceto.lat = Some(-34.586);
        niceto.lng = Some(-58.437);
        venues.create(&u1(), niceto).unwrap();
        venues.create(&u1(), Record::named("Sin mapa").with_city("Rosario")).unwrap();

        let f = venues.facets().unwrap();
        assert_eq!(f.cities, vec!["Palermo", "Rosario"]);
        assert_eq!(venues.map_markers(&MapFilter::default()).unwrap().len(), 1);
    }
}
