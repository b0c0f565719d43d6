//! Integration tests for `SqliteStore`, mostly against an in-memory database.

use std::collections::BTreeSet;

use beacon_core::{
  Classify, ErrorKind,
  component::NewComponent,
  incident::{Impact, NewIncident},
  phase::PhaseRef,
  reference::{NewImpactType, Severity},
  store::{ComponentQuery, IncidentQuery, StatusStore},
  update::NewIncidentUpdate,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// A store with generation 1, one component and one impact type.
async fn seeded() -> (SqliteStore, Uuid, Uuid) {
  let s = store().await;
  s.create_generation(names(&["Scheduled", "Investigating", "Resolved"]))
    .await
    .unwrap();
  let component = s
    .create_component(NewComponent::new("API").with_label("env", "prod"))
    .await
    .unwrap();
  let kind = s
    .create_impact_type(NewImpactType {
      display_name: "Outage".into(),
      description:  "Unavailable".into(),
    })
    .await
    .unwrap();
  (s, component.id, kind.id)
}

fn names(list: &[&str]) -> Vec<String> { list.iter().map(|s| s.to_string()).collect() }

fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() }

fn kind_of(e: &Error) -> ErrorKind { e.kind() }

// ─── Phase generations ───────────────────────────────────────────────────────

#[tokio::test]
async fn empty_store_has_generation_zero() {
  let s = store().await;
  assert_eq!(s.current_generation().await.unwrap(), 0);
}

#[tokio::test]
async fn create_generation_increments_and_lists_in_order() {
  let s = store().await;

  let g1 = s
    .create_generation(names(&["Scheduled", "Investigating", "Resolved"]))
    .await
    .unwrap();
  assert_eq!(g1, 1);
  assert_eq!(s.current_generation().await.unwrap(), 1);
  assert_eq!(
    s.list_phases(None).await.unwrap(),
    names(&["Scheduled", "Investigating", "Resolved"])
  );

  let g2 = s.create_generation(names(&["Open", "Closed"])).await.unwrap();
  assert_eq!(g2, 2);
  assert_eq!(s.current_generation().await.unwrap(), 2);
  assert_eq!(s.list_phases(None).await.unwrap(), names(&["Open", "Closed"]));
  assert_eq!(s.list_phases(Some(2)).await.unwrap(), names(&["Open", "Closed"]));
}

#[tokio::test]
async fn list_phases_rejects_out_of_range_generations() {
  let s = store().await;
  s.create_generation(names(&["Open"])).await.unwrap();

  for g in [0, -1] {
    let err = s.list_phases(Some(g)).await.unwrap_err();
    assert_eq!(kind_of(&err), ErrorKind::InvalidArgument, "generation {g}");
  }
  let err = s.list_phases(Some(2)).await.unwrap_err();
  assert_eq!(kind_of(&err), ErrorKind::NotFound);
}

#[tokio::test]
async fn empty_generation_is_rejected_and_not_allocated() {
  let s = store().await;
  let err = s.create_generation(vec![]).await.unwrap_err();
  assert_eq!(kind_of(&err), ErrorKind::InvalidArgument);
  assert_eq!(s.current_generation().await.unwrap(), 0);
}

#[tokio::test]
async fn new_generation_leaves_old_incidents_and_phases_alone() {
  let s = store().await;
  s.create_generation(names(&["Scheduled", "Investigating", "Resolved"]))
    .await
    .unwrap();
  assert_eq!(s.current_generation().await.unwrap(), 1);

  let mut input = NewIncident::new("Login failures", t0());
  input.phase = Some(PhaseRef::new(1, 1));
  let incident = s.create_incident(input).await.unwrap();
  assert_eq!(incident.phase, PhaseRef::new(1, 1));

  s.create_generation(names(&["Open", "Closed"])).await.unwrap();

  let fetched = s.get_incident(incident.id).await.unwrap().unwrap();
  assert_eq!(fetched.phase, PhaseRef::new(1, 1));
  assert_eq!(
    s.list_phases(Some(1)).await.unwrap(),
    names(&["Scheduled", "Investigating", "Resolved"])
  );
}

#[tokio::test]
async fn phases_cannot_be_rewritten_in_place() {
  let s = store().await;
  s.create_generation(names(&["Open"])).await.unwrap();

  let result = s
    .conn
    .call(|conn| {
      conn.execute("UPDATE phases SET name = 'Renamed'", [])?;
      Ok(())
    })
    .await;
  assert!(result.is_err());
  assert_eq!(s.list_phases(Some(1)).await.unwrap(), names(&["Open"]));
}

// ─── Components and labels ───────────────────────────────────────────────────

#[tokio::test]
async fn component_roundtrip_with_labels() {
  let s = store().await;
  let created = s
    .create_component(
      NewComponent::new("Database")
        .with_label("env", "prod")
        .with_label("region", "eu"),
    )
    .await
    .unwrap();

  let fetched = s.get_component(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
  assert_eq!(fetched.labels["region"], "eu");
}

#[tokio::test]
async fn update_component_replaces_labels() {
  let s = store().await;
  let created = s
    .create_component(NewComponent::new("Cache").with_label("env", "prod"))
    .await
    .unwrap();

  s.update_component(created.id, NewComponent::new("Cache v2").with_label("tier", "2"))
    .await
    .unwrap();

  let fetched = s.get_component(created.id).await.unwrap().unwrap();
  assert_eq!(fetched.display_name, "Cache v2");
  assert_eq!(fetched.labels.len(), 1);
  assert_eq!(fetched.labels["tier"], "2");
}

#[tokio::test]
async fn missing_component_is_not_found() {
  let s = store().await;
  assert!(s.get_component(Uuid::new_v4()).await.unwrap().is_none());

  let err = s
    .update_component(Uuid::new_v4(), NewComponent::new("x"))
    .await
    .unwrap_err();
  assert_eq!(kind_of(&err), ErrorKind::NotFound);

  let err = s.delete_component(Uuid::new_v4()).await.unwrap_err();
  assert_eq!(kind_of(&err), ErrorKind::NotFound);
}

#[tokio::test]
async fn label_filter_uses_containment() {
  let s = store().await;
  let eu_prod = s
    .create_component(
      NewComponent::new("A")
        .with_label("env", "prod")
        .with_label("region", "eu"),
    )
    .await
    .unwrap();
  let us_prod = s
    .create_component(
      NewComponent::new("B")
        .with_label("env", "prod")
        .with_label("region", "us"),
    )
    .await
    .unwrap();
  s.create_component(NewComponent::new("C")).await.unwrap();

  let mut query = ComponentQuery::default();
  assert_eq!(s.list_components(&query).await.unwrap().len(), 3);

  query.labels.insert("env".into(), "prod".into());
  let ids: BTreeSet<Uuid> = s
    .list_components(&query)
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.id)
    .collect();
  assert_eq!(ids, BTreeSet::from([eu_prod.id, us_prod.id]));

  query.labels.insert("region".into(), "eu".into());
  let found = s.list_components(&query).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].id, eu_prod.id);
  // Extra labels on the component are returned in full.
  assert_eq!(found[0].labels.len(), 2);

  query.labels.insert("region".into(), "ap".into());
  assert!(s.list_components(&query).await.unwrap().is_empty());
}

#[tokio::test]
async fn label_filter_combines_with_affected_filter() {
  let (s, api, kind) = seeded().await;
  let web = s
    .create_component(NewComponent::new("Web").with_label("env", "prod"))
    .await
    .unwrap();

  let mut input = NewIncident::new("API down", t0());
  input.impacts = vec![Impact::new(api, kind, 80).unwrap()];
  s.create_incident(input).await.unwrap();

  let mut query = ComponentQuery::default();
  query.labels.insert("env".into(), "prod".into());
  assert_eq!(s.list_components(&query).await.unwrap().len(), 2);

  query.affected = true;
  let found = s.list_components(&query).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].id, api);

  query.at = Some(t0() - Duration::seconds(1));
  assert!(s.list_components(&query).await.unwrap().is_empty());

  query.at = Some(t0() + Duration::hours(1));
  let found = s.list_components(&query).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_ne!(found[0].id, web.id);
}

// ─── Reference data ──────────────────────────────────────────────────────────

#[tokio::test]
async fn impact_type_crud() {
  let s = store().await;
  let created = s
    .create_impact_type(NewImpactType {
      display_name: "Degraded".into(),
      description:  String::new(),
    })
    .await
    .unwrap();
  assert_eq!(s.list_impact_types().await.unwrap(), vec![created.clone()]);

  let updated = s
    .update_impact_type(
      created.id,
      NewImpactType {
        display_name: "Degraded performance".into(),
        description:  "Slow".into(),
      },
    )
    .await
    .unwrap();
  assert_eq!(s.get_impact_type(created.id).await.unwrap(), Some(updated));

  s.delete_impact_type(created.id).await.unwrap();
  assert!(s.get_impact_type(created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn severity_crud_and_uniqueness() {
  let s = store().await;
  s.create_severity(Severity::new("Minor", 20).unwrap()).await.unwrap();
  s.create_severity(Severity::new("Major", 80).unwrap()).await.unwrap();

  let listed: Vec<u8> = s
    .list_severities()
    .await
    .unwrap()
    .into_iter()
    .map(|sev| sev.value)
    .collect();
  assert_eq!(listed, vec![20, 80]);

  let err = s
    .create_severity(Severity::new("Also major", 80).unwrap())
    .await
    .unwrap_err();
  assert_eq!(kind_of(&err), ErrorKind::Conflict);

  let err = s
    .create_severity(Severity::new("Minor", 30).unwrap())
    .await
    .unwrap_err();
  assert_eq!(kind_of(&err), ErrorKind::Conflict);

  s.update_severity("Minor".into(), Severity::new("Low", 10).unwrap())
    .await
    .unwrap();
  assert!(s.get_severity("Minor".into()).await.unwrap().is_none());
  assert_eq!(s.get_severity("Low".into()).await.unwrap().unwrap().value, 10);

  s.delete_severity("Low".into()).await.unwrap();
  let err = s.delete_severity("Low".into()).await.unwrap_err();
  assert_eq!(kind_of(&err), ErrorKind::NotFound);
}

#[tokio::test]
async fn referenced_component_and_impact_type_cannot_be_deleted() {
  let (s, component, kind) = seeded().await;
  let mut input = NewIncident::new("Outage", t0());
  input.impacts = vec![Impact::new(component, kind, 50).unwrap()];
  let incident = s.create_incident(input).await.unwrap();

  let err = s.delete_component(component).await.unwrap_err();
  assert_eq!(kind_of(&err), ErrorKind::Conflict);
  let err = s.delete_impact_type(kind).await.unwrap_err();
  assert_eq!(kind_of(&err), ErrorKind::Conflict);

  s.delete_incident(incident.id).await.unwrap();
  s.delete_component(component).await.unwrap();
  s.delete_impact_type(kind).await.unwrap();
}

// ─── Incidents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn incident_without_phase_pins_current_generation_start() {
  let (s, ..) = seeded().await;
  s.create_generation(names(&["Open", "Closed"])).await.unwrap();

  let incident = s
    .create_incident(NewIncident::new("Slow logins", t0()))
    .await
    .unwrap();
  assert_eq!(incident.phase, PhaseRef::new(2, 0));
}

#[tokio::test]
async fn incident_without_any_generation_is_not_found() {
  let s = store().await;
  let err = s
    .create_incident(NewIncident::new("Nothing", t0()))
    .await
    .unwrap_err();
  assert_eq!(kind_of(&err), ErrorKind::NotFound);
}

#[tokio::test]
async fn incident_with_unknown_phase_is_not_found() {
  let (s, ..) = seeded().await;
  let mut input = NewIncident::new("Bad phase", t0());
  input.phase = Some(PhaseRef::new(1, 3));
  let err = s.create_incident(input).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(beacon_core::Error::PhaseNotFound(p)) if p == PhaseRef::new(1, 3)
  ));
}

#[tokio::test]
async fn incident_ending_before_it_begins_is_invalid() {
  let (s, ..) = seeded().await;
  let mut input = NewIncident::new("Backwards", t0());
  input.ended_at = Some(t0() - Duration::minutes(1));
  let err = s.create_incident(input).await.unwrap_err();
  assert_eq!(kind_of(&err), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn incident_with_unknown_impact_target_writes_nothing() {
  let (s, component, _) = seeded().await;
  let mut input = NewIncident::new("Ghost", t0());
  input.impacts = vec![Impact::new(component, Uuid::new_v4(), 10).unwrap()];
  let err = s.create_incident(input).await.unwrap_err();
  assert_eq!(kind_of(&err), ErrorKind::NotFound);
  assert!(s.list_incidents(&IncidentQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_incident_replaces_impacts_and_keeps_phase_when_omitted() {
  let (s, api, outage) = seeded().await;
  let degraded = s
    .create_impact_type(NewImpactType {
      display_name: "Degraded".into(),
      description:  String::new(),
    })
    .await
    .unwrap();

  let mut input = NewIncident::new("API", t0());
  input.phase = Some(PhaseRef::new(1, 1));
  input.impacts = vec![Impact::new(api, outage, 90).unwrap()];
  let incident = s.create_incident(input.clone()).await.unwrap();

  input.phase = None;
  input.description = "Recovering".into();
  input.impacts = vec![Impact::new(api, degraded.id, 30).unwrap()];
  let updated = s.update_incident(incident.id, input).await.unwrap();
  assert_eq!(updated.phase, PhaseRef::new(1, 1));
  assert_eq!(updated.description, "Recovering");

  let affected = s.affected_components(incident.id, None).await.unwrap();
  assert_eq!(affected.len(), 1);
  assert_eq!(affected[0].impact_type_id, degraded.id);
  assert_eq!(affected[0].severity, 30);
}

#[tokio::test]
async fn failed_incident_update_keeps_prior_impacts() {
  let (s, api, outage) = seeded().await;
  let mut input = NewIncident::new("API", t0());
  input.impacts = vec![Impact::new(api, outage, 90).unwrap()];
  let incident = s.create_incident(input.clone()).await.unwrap();

  input.impacts = vec![Impact::new(Uuid::new_v4(), outage, 10).unwrap()];
  let err = s.update_incident(incident.id, input).await.unwrap_err();
  assert_eq!(kind_of(&err), ErrorKind::NotFound);

  let affected = s.affected_components(incident.id, None).await.unwrap();
  assert_eq!(affected.len(), 1);
  assert_eq!(affected[0].severity, 90);
}

#[tokio::test]
async fn impact_insert_failure_rolls_back_the_whole_update() {
  let (s, api, outage) = seeded().await;
  let degraded = s
    .create_impact_type(NewImpactType {
      display_name: "Degraded".into(),
      description:  String::new(),
    })
    .await
    .unwrap();

  let mut input = NewIncident::new("API", t0());
  input.impacts = vec![Impact::new(api, outage, 90).unwrap()];
  let incident = s.create_incident(input.clone()).await.unwrap();

  // Inserts into `impacts` now fail, after the replacement's delete has run.
  s.conn
    .call(|conn| {
      conn.execute_batch(
        "CREATE TRIGGER impacts_blocked BEFORE INSERT ON impacts
         BEGIN SELECT RAISE(ABORT, 'impacts blocked'); END;",
      )?;
      Ok(())
    })
    .await
    .unwrap();

  input.description = "Recovering".into();
  input.impacts = vec![Impact::new(api, degraded.id, 30).unwrap()];
  let err = s.update_incident(incident.id, input).await.unwrap_err();
  assert_eq!(kind_of(&err), ErrorKind::Conflict);

  let affected = s.affected_components(incident.id, None).await.unwrap();
  assert_eq!(affected, vec![Impact::new(api, outage, 90).unwrap()]);
  let fetched = s.get_incident(incident.id).await.unwrap().unwrap();
  assert_eq!(fetched.description, "");
}

#[tokio::test]
async fn update_missing_incident_is_not_found() {
  let (s, ..) = seeded().await;
  let err = s
    .update_incident(Uuid::new_v4(), NewIncident::new("x", t0()))
    .await
    .unwrap_err();
  assert_eq!(kind_of(&err), ErrorKind::NotFound);
}

#[tokio::test]
async fn delete_incident_cascades_to_updates() {
  let (s, ..) = seeded().await;
  let incident = s.create_incident(NewIncident::new("x", t0())).await.unwrap();
  s.create_update(incident.id, NewIncidentUpdate::new("Looking", ""))
    .await
    .unwrap();

  s.delete_incident(incident.id).await.unwrap();
  assert!(s.get_incident(incident.id).await.unwrap().is_none());
  assert!(s.get_update(incident.id, 0).await.unwrap().is_none());
}

#[tokio::test]
async fn list_incidents_active_filter() {
  let (s, ..) = seeded().await;
  let mut closed = NewIncident::new("Closed", t0());
  closed.ended_at = Some(t0() + Duration::minutes(10));
  let closed = s.create_incident(closed).await.unwrap();
  let open = s
    .create_incident(NewIncident::new("Open", t0() + Duration::minutes(5)))
    .await
    .unwrap();

  let all = s.list_incidents(&IncidentQuery::default()).await.unwrap();
  assert_eq!(all.iter().map(|i| i.id).collect::<Vec<_>>(), vec![open.id, closed.id]);

  let ongoing = s
    .list_incidents(&IncidentQuery { active: true, at: None })
    .await
    .unwrap();
  assert_eq!(ongoing.len(), 1);
  assert_eq!(ongoing[0].id, open.id);

  let early = s
    .list_incidents(&IncidentQuery { active: true, at: Some(t0() + Duration::minutes(1)) })
    .await
    .unwrap();
  assert_eq!(early.len(), 1);
  assert_eq!(early[0].id, closed.id);
}

// ─── Temporal impact resolution ──────────────────────────────────────────────

#[tokio::test]
async fn impact_window_is_half_open() {
  let (s, component, kind) = seeded().await;
  let mut input = NewIncident::new("Window", t0());
  input.ended_at = Some(t0() + Duration::minutes(10));
  input.impacts = vec![Impact::new(component, kind, 40).unwrap()];
  let incident = s.create_incident(input).await.unwrap();

  let at = |d: Duration| Some(t0() + d);

  assert_eq!(s.affected_components(incident.id, at(Duration::zero())).await.unwrap().len(), 1);
  assert_eq!(
    s.affected_components(incident.id, at(Duration::minutes(10) - Duration::microseconds(1)))
      .await
      .unwrap()
      .len(),
    1
  );
  assert!(s.affected_components(incident.id, at(Duration::minutes(10))).await.unwrap().is_empty());
  assert!(s.affected_components(incident.id, at(-Duration::seconds(1))).await.unwrap().is_empty());
  // Omitted instant means "ongoing"; this incident has ended.
  assert!(s.affected_components(incident.id, None).await.unwrap().is_empty());

  assert_eq!(s.affecting_incidents(component, at(Duration::minutes(5))).await.unwrap().len(), 1);
  assert!(s.affecting_incidents(component, at(Duration::minutes(10))).await.unwrap().is_empty());
  assert!(s.affecting_incidents(component, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn stored_window_agrees_with_resolution() {
  let (s, component, kind) = seeded().await;
  let mut input = NewIncident::new("Window", t0() + Duration::nanoseconds(900));
  input.ended_at = Some(t0() + Duration::minutes(10));
  input.impacts = vec![Impact::new(component, kind, 40).unwrap()];
  let incident = s.create_incident(input).await.unwrap();

  // Instants are kept to the microsecond.
  assert_eq!(incident.began_at, t0());

  let window = incident.window();
  let instants = [
    t0() - Duration::seconds(1),
    t0(),
    t0() + Duration::nanoseconds(100),
    t0() + Duration::minutes(5),
    t0() + Duration::minutes(10) - Duration::microseconds(1),
    t0() + Duration::minutes(10),
    t0() + Duration::days(1),
  ];
  for at in instants {
    let resolved = !s.affected_components(incident.id, Some(at)).await.unwrap().is_empty();
    assert_eq!(resolved, window.contains(at), "at {at}");
  }
  let ongoing = !s.affected_components(incident.id, None).await.unwrap().is_empty();
  assert_eq!(ongoing, window.is_active(None));
}

#[tokio::test]
async fn ongoing_incident_is_included_without_instant() {
  let (s, component, kind) = seeded().await;
  let mut input = NewIncident::new("Open ended", t0());
  input.impacts = vec![Impact::new(component, kind, 40).unwrap()];
  let incident = s.create_incident(input).await.unwrap();

  assert_eq!(s.affected_components(incident.id, None).await.unwrap().len(), 1);
  assert_eq!(
    s.affected_components(incident.id, Some(t0() + Duration::days(30)))
      .await
      .unwrap()
      .len(),
    1
  );

  let affecting = s.affecting_incidents(component, None).await.unwrap();
  assert_eq!(affecting.len(), 1);
  assert_eq!(affecting[0].incident_id, incident.id);
  assert_eq!(affecting[0].impact_type_id, kind);
  assert_eq!(affecting[0].severity, 40);
}

#[tokio::test]
async fn ending_an_incident_clears_current_impacts() {
  let (s, component, kind) = seeded().await;
  let now = Utc::now();

  let mut input = NewIncident::new("Degraded API", now - Duration::minutes(10));
  input.impacts = vec![Impact::new(component, kind, 50).unwrap()];
  let incident = s.create_incident(input.clone()).await.unwrap();

  let affected = s.affected_components(incident.id, None).await.unwrap();
  assert_eq!(affected.len(), 1);
  assert_eq!(affected[0].component_id, component);
  assert_eq!(affected[0].severity, 50);

  input.ended_at = Some(now - Duration::minutes(1));
  s.update_incident(incident.id, input).await.unwrap();

  assert!(s.affected_components(incident.id, None).await.unwrap().is_empty());
  assert!(s.affected_components(incident.id, Some(Utc::now())).await.unwrap().is_empty());
}

#[tokio::test]
async fn resolution_for_missing_entities_is_not_found() {
  let s = store().await;
  let err = s.affected_components(Uuid::new_v4(), None).await.unwrap_err();
  assert_eq!(kind_of(&err), ErrorKind::NotFound);
  let err = s.affecting_incidents(Uuid::new_v4(), None).await.unwrap_err();
  assert_eq!(kind_of(&err), ErrorKind::NotFound);
}

// ─── Incident updates ────────────────────────────────────────────────────────

#[tokio::test]
async fn updates_are_numbered_densely_from_zero() {
  let (s, ..) = seeded().await;
  let incident = s.create_incident(NewIncident::new("x", t0())).await.unwrap();
  assert_eq!(s.next_update_order(incident.id).await.unwrap(), 0);

  for expected in 0..5 {
    let update = s
      .create_update(incident.id, NewIncidentUpdate::new(format!("step {expected}"), ""))
      .await
      .unwrap();
    assert_eq!(update.order, expected);
  }
  assert_eq!(s.next_update_order(incident.id).await.unwrap(), 5);

  let listed: Vec<u32> = s
    .list_updates(incident.id)
    .await
    .unwrap()
    .into_iter()
    .map(|u| u.order)
    .collect();
  assert_eq!(listed, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn concurrent_update_creation_never_duplicates_an_order() {
  let (s, ..) = seeded().await;
  let incident = s.create_incident(NewIncident::new("x", t0())).await.unwrap();

  let n = 32;
  let handles: Vec<_> = (0..n)
    .map(|i| {
      let s = s.clone();
      tokio::spawn(async move {
        s.create_update(incident.id, NewIncidentUpdate::new(format!("update {i}"), ""))
          .await
          .unwrap()
          .order
      })
    })
    .collect();

  let mut orders = BTreeSet::new();
  for h in handles {
    assert!(orders.insert(h.await.unwrap()), "duplicate order allocated");
  }
  assert_eq!(orders, (0..n).collect::<BTreeSet<u32>>());
}

#[tokio::test]
async fn update_orders_stay_dense_across_connections() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("beacon.db");

  let first = SqliteStore::open(&path).await.unwrap();
  first.create_generation(names(&["Open"])).await.unwrap();
  let incident = first.create_incident(NewIncident::new("x", t0())).await.unwrap();
  // A second handle is a second SQLite connection with its own thread.
  let second = SqliteStore::open(&path).await.unwrap();

  let n: u32 = 40;
  let handles: Vec<_> = (0..n)
    .map(|i| {
      let s = if i % 2 == 0 { first.clone() } else { second.clone() };
      tokio::spawn(async move {
        s.create_update(incident.id, NewIncidentUpdate::new(format!("update {i}"), ""))
          .await
          .map(|u| u.order)
      })
    })
    .collect();

  let mut orders = BTreeSet::new();
  for h in handles {
    let order = h.await.unwrap().unwrap();
    assert!(orders.insert(order), "duplicate order {order} allocated");
  }
  assert_eq!(orders, (0..n).collect::<BTreeSet<u32>>());

  let listed: Vec<u32> = second
    .list_updates(incident.id)
    .await
    .unwrap()
    .into_iter()
    .map(|u| u.order)
    .collect();
  assert_eq!(listed, (0..n).collect::<Vec<u32>>());
}

#[tokio::test]
async fn update_orders_are_per_incident() {
  let (s, ..) = seeded().await;
  let a = s.create_incident(NewIncident::new("a", t0())).await.unwrap();
  let b = s.create_incident(NewIncident::new("b", t0())).await.unwrap();

  s.create_update(a.id, NewIncidentUpdate::new("a0", "")).await.unwrap();
  s.create_update(a.id, NewIncidentUpdate::new("a1", "")).await.unwrap();
  let b0 = s.create_update(b.id, NewIncidentUpdate::new("b0", "")).await.unwrap();
  assert_eq!(b0.order, 0);
}

#[tokio::test]
async fn deleting_an_update_leaves_a_gap() {
  let (s, ..) = seeded().await;
  let incident = s.create_incident(NewIncident::new("x", t0())).await.unwrap();
  for i in 0..3 {
    s.create_update(incident.id, NewIncidentUpdate::new(format!("{i}"), ""))
      .await
      .unwrap();
  }

  s.delete_update(incident.id, 1).await.unwrap();
  let next = s
    .create_update(incident.id, NewIncidentUpdate::new("after", ""))
    .await
    .unwrap();
  assert_eq!(next.order, 3);

  let listed: Vec<u32> = s
    .list_updates(incident.id)
    .await
    .unwrap()
    .into_iter()
    .map(|u| u.order)
    .collect();
  assert_eq!(listed, vec![0, 2, 3]);

  let err = s.delete_update(incident.id, 1).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(beacon_core::Error::UpdateNotFound { order: 1, .. })
  ));
}

#[tokio::test]
async fn deleting_the_latest_update_frees_its_order() {
  let (s, ..) = seeded().await;
  let incident = s.create_incident(NewIncident::new("x", t0())).await.unwrap();
  for i in 0..2 {
    s.create_update(incident.id, NewIncidentUpdate::new(format!("{i}"), ""))
      .await
      .unwrap();
  }

  s.delete_update(incident.id, 1).await.unwrap();
  assert_eq!(s.next_update_order(incident.id).await.unwrap(), 1);
}

#[tokio::test]
async fn editing_an_update_keeps_its_order() {
  let (s, ..) = seeded().await;
  let incident = s.create_incident(NewIncident::new("x", t0())).await.unwrap();
  let created = s
    .create_update(incident.id, NewIncidentUpdate::new("Investigating", "looking"))
    .await
    .unwrap();

  let edited = s
    .update_update(incident.id, 0, NewIncidentUpdate::new("Identified", "found it"))
    .await
    .unwrap();
  assert_eq!(edited.order, 0);
  assert_eq!(edited.display_name, "Identified");
  assert_eq!(edited.created_at, created.created_at);
  assert_eq!(s.get_update(incident.id, 0).await.unwrap(), Some(edited));

  let err = s
    .update_update(incident.id, 7, NewIncidentUpdate::new("nope", ""))
    .await
    .unwrap_err();
  assert_eq!(kind_of(&err), ErrorKind::NotFound);
}

#[tokio::test]
async fn updates_of_missing_incident_are_not_found() {
  let s = store().await;
  let id = Uuid::new_v4();
  for err in [
    s.create_update(id, NewIncidentUpdate::new("x", "")).await.unwrap_err(),
    s.list_updates(id).await.unwrap_err(),
    s.next_update_order(id).await.unwrap_err(),
  ] {
    assert_eq!(kind_of(&err), ErrorKind::NotFound);
  }
}
