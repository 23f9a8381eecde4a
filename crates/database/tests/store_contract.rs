//! The store contracts as seen through a migrated in-memory SQLite database.

use std::sync::Arc;

use chrono::NaiveDate;
use database::Database;
use payroll_core::{
    DateRange, Employee, EmployeeStore, NewShift, PayoutEngine, ShiftStore, StoreError,
};

async fn test_db() -> Arc<Database> {
    let db = Database::connect_with_pool_size("sqlite::memory:", 1)
        .await
        .unwrap();
    db.migrate().await.unwrap();
    Arc::new(db)
}

fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

#[tokio::test]
async fn test_range_bounds_are_inclusive() {
    let db = test_db().await;
    for (m, d) in [(1, 31), (2, 1), (2, 29), (3, 1)] {
        db.add_shift(NewShift::new(5, day(m, d), 10.0).unwrap())
            .await
            .unwrap();
    }

    let february = DateRange::month(2024, 2).unwrap();
    let shifts = db.get_shifts(5, february).await.unwrap();

    let mut dates: Vec<_> = shifts.iter().map(|s| s.date).collect();
    dates.sort();
    assert_eq!(dates, vec![day(2, 1), day(2, 29)]);
}

#[tokio::test]
async fn test_all_time_window_sees_everything() {
    let db = test_db().await;
    db.add_shift(NewShift::new(5, NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(), 1.0).unwrap())
        .await
        .unwrap();
    db.add_shift(NewShift::new(5, NaiveDate::from_ymd_opt(2090, 12, 31).unwrap(), 1.0).unwrap())
        .await
        .unwrap();

    let shifts = db.get_shifts(5, DateRange::all_time()).await.unwrap();
    assert_eq!(shifts.len(), 2);
}

#[tokio::test]
async fn test_bulk_mark_paid_scoped_to_employee_and_range() {
    let db = test_db().await;
    db.add_shift(NewShift::new(5, day(1, 10), 10.0).unwrap()).await.unwrap();
    db.add_shift(NewShift::new(5, day(2, 10), 10.0).unwrap()).await.unwrap();
    db.add_shift(NewShift::new(6, day(1, 10), 10.0).unwrap()).await.unwrap();

    let touched = db
        .mark_shifts_paid(5, DateRange::month(2024, 1).unwrap())
        .await
        .unwrap();
    assert_eq!(touched, 1);

    let paid: Vec<_> = db
        .get_shifts(5, DateRange::all_time())
        .await
        .unwrap()
        .into_iter()
        .filter(|s| s.paid)
        .collect();
    assert_eq!(paid.len(), 1);
    assert_eq!(paid[0].date, day(1, 10));

    let other = db.get_shifts(6, DateRange::all_time()).await.unwrap();
    assert!(other.iter().all(|s| !s.paid));
}

#[tokio::test]
async fn test_payment_split_persists() {
    let db = test_db().await;
    let a = db.add_shift(NewShift::new(5, day(1, 5), 30.0).unwrap()).await.unwrap();
    let b = db.add_shift(NewShift::new(5, day(1, 2), 50.0).unwrap()).await.unwrap();
    let c = db.add_shift(NewShift::new(5, day(1, 1), 20.0).unwrap()).await.unwrap();

    let engine = PayoutEngine::new(db.clone());
    engine.apply_payment(5, 40.0).await.unwrap();

    let shifts = db.get_shifts(5, DateRange::all_time()).await.unwrap();
    let find = |id| shifts.iter().find(|s| s.id == id).unwrap();
    assert!(find(c).paid);
    assert!(!find(a).paid);
    assert_eq!(find(a).amount, 30.0);
    assert!(!find(b).paid);
    assert_eq!(find(b).amount, 30.0);
}

#[tokio::test]
async fn test_employee_contract() {
    let db = test_db().await;

    let missing = db.get_employee(77).await;
    assert!(matches!(missing, Err(StoreError::NotFound { .. })));

    db.upsert_employee(&Employee::new(77, "Boris", 770)).await.unwrap();
    db.upsert_employee(&Employee::new(12, "Vera", 120)).await.unwrap();
    db.upsert_employee(&Employee::new(77, "Boris K.", 771)).await.unwrap();

    let boris = db.get_employee(77).await.unwrap();
    assert_eq!(boris.name, "Boris K.");
    assert_eq!(boris.chat_id, 771);
    assert_eq!(boris.role, "employee");

    let all = db.get_all_employees().await.unwrap();
    let ids: Vec<_> = all.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![12, 77]);

    db.delete_employee(12).await.unwrap();
    assert!(db.get_employee(12).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_shifts_resets_employee() {
    let db = test_db().await;
    db.add_shift(NewShift::new(5, day(1, 1), 10.0).unwrap()).await.unwrap();
    db.add_shift(NewShift::new(5, day(1, 2), 10.0).unwrap()).await.unwrap();
    db.add_shift(NewShift::new(6, day(1, 2), 10.0).unwrap()).await.unwrap();

    assert_eq!(db.delete_shifts(5).await.unwrap(), 2);
    assert!(db.get_shifts(5, DateRange::all_time()).await.unwrap().is_empty());
    assert_eq!(db.get_shifts(6, DateRange::all_time()).await.unwrap().len(), 1);
}
