//! Service-layer tests against the in-memory repository.

use chrono::{NaiveDate, NaiveDateTime};

use crate::db::repositories::LocalRepository;
use crate::db::repository::RepositoryError;
use crate::db::services;
use crate::models::{ClientId, NewClient, NewOrder, NewOrderLine, NewProduct, ProductId};

fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

async fn seed_client(repo: &LocalRepository, name: &str) -> ClientId {
    services::register_client(
        repo,
        &NewClient {
            first_name: Some(name.to_string()),
            last_name: Some("Perez".to_string()),
        },
    )
    .await
    .unwrap()
}

async fn seed_product(repo: &LocalRepository, name: &str) -> ProductId {
    services::register_product(
        repo,
        &NewProduct {
            name: Some(name.to_string()),
        },
    )
    .await
    .unwrap()
}

fn line(product_id: ProductId, quantity: i32) -> NewOrderLine {
    NewOrderLine {
        product_id,
        quantity: Some(quantity),
        unit_price: Some(10),
        subtotal: Some(10 * quantity),
    }
}

/// Insert one order per line so each line can carry its own order date.
async fn seed_lines(
    repo: &LocalRepository,
    client_id: ClientId,
    product_id: ProductId,
    order_date: NaiveDateTime,
    line_count: usize,
) {
    for _ in 0..line_count {
        services::insert_order_with_lines(
            repo,
            &NewOrder {
                client_id,
                date: order_date,
                status: Some("pendiente".to_string()),
                total: None,
                lines: vec![line(product_id, 1)],
            },
        )
        .await
        .unwrap();
    }
}

#[tokio::test]
async fn insert_order_creates_one_order_and_n_lines() {
    let repo = LocalRepository::new();
    let client_id = seed_client(&repo, "Maria").await;
    let product_id = seed_product(&repo, "Monitor").await;

    let order_id = services::insert_order_with_lines(
        &repo,
        &NewOrder {
            client_id,
            date: date(2024, 4, 6),
            status: Some("nuevo".to_string()),
            total: Some(60),
            lines: vec![
                line(product_id, 1),
                line(product_id, 2),
                line(product_id, 3),
            ],
        },
    )
    .await
    .unwrap();

    assert_eq!(repo.order_count(), 1);
    assert_eq!(repo.order_line_count(), 3);

    let stored = services::get_order(&repo, order_id).await.unwrap();
    assert_eq!(stored.lines.len(), 3);
    assert!(stored.lines.iter().all(|l| l.order_id == order_id));
    assert!(stored.lines.iter().all(|l| l.product_id == product_id));
}

#[tokio::test]
async fn join_report_resolves_names_through_relations() {
    let repo = LocalRepository::new();
    let client_id = seed_client(&repo, "Carla").await;
    let keyboard = seed_product(&repo, "Teclado").await;
    let mouse = seed_product(&repo, "Mouse").await;

    services::insert_order_with_lines(
        &repo,
        &NewOrder {
            client_id,
            date: date(2024, 2, 14),
            status: None,
            total: None,
            lines: vec![line(keyboard, 1), line(mouse, 4)],
        },
    )
    .await
    .unwrap();

    let report = services::order_client_product_report(&repo).await.unwrap();
    assert_eq!(report.len(), 2);
    assert!(report
        .iter()
        .all(|row| row.client_name.as_deref() == Some("Carla")));
    assert!(report
        .iter()
        .all(|row| row.order_date == date(2024, 2, 14)));

    let product_names: Vec<_> = report
        .iter()
        .map(|row| row.product_name.clone().unwrap())
        .collect();
    assert!(product_names.contains(&"Teclado".to_string()));
    assert!(product_names.contains(&"Mouse".to_string()));
}

#[tokio::test]
async fn top_products_truncates_to_three_and_sorts_descending() {
    let repo = LocalRepository::new();
    let client_id = seed_client(&repo, "Jose").await;
    let a = seed_product(&repo, "A").await;
    let b = seed_product(&repo, "B").await;
    let c = seed_product(&repo, "C").await;
    let d = seed_product(&repo, "D").await;

    let when = date(2024, 3, 1);
    seed_lines(&repo, client_id, a, when, 5).await;
    seed_lines(&repo, client_id, b, when, 5).await;
    seed_lines(&repo, client_id, c, when, 3).await;
    seed_lines(&repo, client_id, d, when, 1).await;

    let top = services::top_ordered_products(&repo).await.unwrap();
    assert_eq!(top.len(), 3);

    // Sorted by descending line count.
    assert!(top.windows(2).all(|w| w[0].line_count >= w[1].line_count));

    // Both five-line products must be present; their mutual order is
    // implementation-defined and deliberately not asserted.
    let names: Vec<_> = top
        .iter()
        .map(|p| p.product_name.clone().unwrap())
        .collect();
    assert!(names.contains(&"A".to_string()));
    assert!(names.contains(&"B".to_string()));
    assert_eq!(top[2].line_count, 3);
}

#[tokio::test]
async fn top_products_counts_lines_not_quantities() {
    let repo = LocalRepository::new();
    let client_id = seed_client(&repo, "Rosa").await;
    let bulk = seed_product(&repo, "Granel").await;
    let frequent = seed_product(&repo, "Frecuente").await;

    // One line with a huge quantity...
    services::insert_order_with_lines(
        &repo,
        &NewOrder {
            client_id,
            date: date(2024, 5, 1),
            status: None,
            total: None,
            lines: vec![line(bulk, 1000)],
        },
    )
    .await
    .unwrap();
    // ...loses to three separate lines of quantity one.
    seed_lines(&repo, client_id, frequent, date(2024, 5, 2), 3).await;

    let top = services::top_ordered_products(&repo).await.unwrap();
    assert_eq!(top[0].product_name.as_deref(), Some("Frecuente"));
    assert_eq!(top[0].line_count, 3);
    assert_eq!(top[1].product_name.as_deref(), Some("Granel"));
    assert_eq!(top[1].line_count, 1);
}

#[tokio::test]
async fn date_range_report_includes_boundary_dates() {
    let repo = LocalRepository::new();
    let client_id = seed_client(&repo, "Ivan").await;
    let before = seed_product(&repo, "Antes").await;
    let on_start = seed_product(&repo, "EnInicio").await;
    let middle = seed_product(&repo, "Medio").await;
    let on_end = seed_product(&repo, "EnFin").await;
    let after = seed_product(&repo, "Despues").await;

    seed_lines(&repo, client_id, before, date(2024, 1, 9), 1).await;
    seed_lines(&repo, client_id, on_start, date(2024, 1, 10), 2).await;
    seed_lines(&repo, client_id, middle, date(2024, 1, 15), 4).await;
    seed_lines(&repo, client_id, on_end, date(2024, 1, 20), 3).await;
    seed_lines(&repo, client_id, after, date(2024, 1, 21), 5).await;

    let ranked =
        services::top_ordered_products_between(&repo, date(2024, 1, 10), date(2024, 1, 20))
            .await
            .unwrap();

    let names: Vec<_> = ranked
        .iter()
        .map(|p| p.product_name.clone().unwrap())
        .collect();
    assert_eq!(names.len(), 3);
    assert!(names.contains(&"EnInicio".to_string()));
    assert!(names.contains(&"Medio".to_string()));
    assert!(names.contains(&"EnFin".to_string()));
    assert!(!names.contains(&"Antes".to_string()));
    assert!(!names.contains(&"Despues".to_string()));

    assert_eq!(ranked[0].product_name.as_deref(), Some("Medio"));
    assert_eq!(ranked[0].line_count, 4);
}

#[tokio::test]
async fn date_range_report_returns_full_ranked_list() {
    let repo = LocalRepository::new();
    let client_id = seed_client(&repo, "Nora").await;
    let when = date(2024, 6, 15);

    // Five products inside the window: the range report must return all of
    // them, unlike the all-time top-3 report.
    for (name, lines) in [("P1", 5), ("P2", 4), ("P3", 3), ("P4", 2), ("P5", 1)] {
        let product = seed_product(&repo, name).await;
        seed_lines(&repo, client_id, product, when, lines).await;
    }

    let ranked =
        services::top_ordered_products_between(&repo, date(2024, 6, 1), date(2024, 6, 30))
            .await
            .unwrap();
    assert_eq!(ranked.len(), 5);
    assert!(ranked.windows(2).all(|w| w[0].line_count >= w[1].line_count));
}

#[tokio::test]
async fn inverted_date_range_matches_nothing() {
    let repo = LocalRepository::new();
    let client_id = seed_client(&repo, "Leo").await;
    let product = seed_product(&repo, "Algo").await;
    seed_lines(&repo, client_id, product, date(2024, 7, 10), 2).await;

    let ranked =
        services::top_ordered_products_between(&repo, date(2024, 7, 20), date(2024, 7, 1))
            .await
            .unwrap();
    assert!(ranked.is_empty());
}

#[tokio::test]
async fn delete_client_cascade_removes_dependents_transitively() {
    let repo = LocalRepository::new();
    let doomed = seed_client(&repo, "Borrar").await;
    let survivor = seed_client(&repo, "Quedar").await;
    let product = seed_product(&repo, "Cable").await;

    seed_lines(&repo, doomed, product, date(2024, 8, 1), 3).await;
    seed_lines(&repo, survivor, product, date(2024, 8, 2), 1).await;

    services::delete_client_cascade(&repo, doomed).await.unwrap();

    assert!(repo.find_client(doomed).is_none());
    assert!(repo.find_client(survivor).is_some());
    assert_eq!(repo.order_count(), 1);
    assert_eq!(repo.order_line_count(), 1);

    // Only the survivor's line remains in the join report.
    let report = services::order_client_product_report(&repo).await.unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].client_name.as_deref(), Some("Quedar"));
}

#[tokio::test]
async fn delete_unknown_client_is_a_typed_not_found() {
    let repo = LocalRepository::new();
    let err = services::delete_client_cascade(&repo, ClientId::new(12345))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn health_check_reports_available() {
    let repo = LocalRepository::new();
    assert!(services::health_check(&repo).await.unwrap());
}
