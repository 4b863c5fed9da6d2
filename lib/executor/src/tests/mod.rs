use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use hive_plan_executor_config::execution::ExecutionConfig;
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;

use crate::{
    execute_query_plan,
    response::graphql_error::{codes, ResponsePathSegment},
    services::{local::LocalServiceEndpoint, RequestContext, ServiceEndpoint, ServiceFailure},
    QueryPlanExecutor, ServiceResult,
};

use self::fixtures::*;


fn path(segments: Value) -> Option<Vec<ResponsePathSegment>> {
    Some(serde_json::from_value(segments).unwrap())
}

#[tokio::test]
async fn single_fetch_returns_service_data_unchanged() {
    let calls = Calls::default();
    let registry = registry(vec![(
        "accounts",
        service(&calls, Duration::ZERO, |_| {
            ServiceResult::from_data(json!({
                "me": { "id": "1", "name": "Ada", "birthday": null }
            }))
            .with_errors(vec![error_at("Birthday is private", json!(["me", "birthday"]))])
        }),
    )]);
    let plan = plan(json!({
        "kind": "Fetch",
        "serviceName": "accounts",
        "operation": "{me{id name birthday}}"
    }));

    let output =
        execute_query_plan(&plan, &registry, &no_variables(), &RequestContext::default()).await;

    assert_eq!(
        output.data,
        Some(json!({ "me": { "id": "1", "name": "Ada", "birthday": null } }))
    );
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].path, path(json!(["me", "birthday"])));
    assert_eq!(output.errors[0].service_name(), Some("accounts"));
    assert_eq!(
        output.errors[0].code(),
        Some(codes::DOWNSTREAM_SERVICE_ERROR)
    );
    assert_eq!(calls.to_service("accounts").len(), 1);
}

#[tokio::test]
async fn sequence_makes_earlier_writes_visible_to_later_steps() {
    let calls = Calls::default();
    let registry = registry(vec![
        ("products", products_service(&calls)),
        (
            "reviews",
            service(&calls, Duration::ZERO, |request| {
                entities(request, |representation| {
                    json!({ "reviews": [{ "body": format!("Review of {}", upc(representation)) }] })
                })
            }),
        ),
    ]);

    let in_order = plan(json!({
        "kind": "Sequence",
        "nodes": [top_products_fetch(), product_entities_fetch("reviews", "reviews{body}")]
    }));
    let output =
        execute_query_plan(&in_order, &registry, &no_variables(), &RequestContext::default())
            .await;
    assert!(output.errors.is_empty());
    assert_eq!(
        output.data.as_ref().map(|data| data["topProducts"][2].clone()),
        Some(json!({
            "__typename": "Product",
            "upc": "3",
            "name": "Chair",
            "reviews": [{ "body": "Review of 3" }]
        }))
    );
    assert_eq!(calls.to_service("reviews").len(), 1);

    let reversed_calls = Calls::default();
    let registry = self::fixtures::registry(vec![
        ("products", products_service(&reversed_calls)),
        (
            "reviews",
            service(&reversed_calls, Duration::ZERO, |request| {
                entities(request, |_| json!({ "reviews": [] }))
            }),
        ),
    ]);
    let reversed = plan(json!({
        "kind": "Sequence",
        "nodes": [product_entities_fetch("reviews", "reviews{body}"), top_products_fetch()]
    }));
    let output =
        execute_query_plan(&reversed, &registry, &no_variables(), &RequestContext::default())
            .await;
    assert!(output.errors.is_empty());
    assert_eq!(output.data, Some(top_products()));
    assert!(reversed_calls.to_service("reviews").is_empty());
}

#[tokio::test]
async fn parallel_branches_run_concurrently() {
    let calls = Calls::default();
    let registry = registry(vec![
        (
            "products",
            service(&calls, Duration::from_millis(100), |_| {
                ServiceResult::from_data(top_products())
            }),
        ),
        (
            "accounts",
            service(&calls, Duration::from_millis(100), |_| {
                ServiceResult::from_data(json!({ "me": { "id": "1" } }))
            }),
        ),
    ]);
    let plan = plan(json!({
        "kind": "Parallel",
        "nodes": [
            top_products_fetch(),
            { "kind": "Fetch", "serviceName": "accounts", "operation": "{me{id}}" }
        ]
    }));

    let started = Instant::now();
    let output =
        execute_query_plan(&plan, &registry, &no_variables(), &RequestContext::default()).await;
    let elapsed = started.elapsed();

    assert!(
        elapsed < Duration::from_millis(190),
        "parallel fetches took {:?}",
        elapsed
    );
    assert!(output.errors.is_empty());
    let data = output.data.unwrap();
    assert_eq!(data["me"], json!({ "id": "1" }));
    assert_eq!(data["topProducts"], top_products()["topProducts"]);
}

#[tokio::test]
async fn flatten_sends_one_ordered_batch_and_merges_by_position() {
    let calls = Calls::default();
    let registry = registry(vec![
        ("products", products_service(&calls)),
        (
            "inventory",
            service(&calls, Duration::ZERO, |request| {
                entities(request, |representation| {
                    json!({ "inStock": upc(representation) != "2" })
                })
            }),
        ),
    ]);
    let plan = plan(json!({
        "kind": "Sequence",
        "nodes": [top_products_fetch(), product_entities_fetch("inventory", "inStock")]
    }));

    let output =
        execute_query_plan(&plan, &registry, &no_variables(), &RequestContext::default()).await;

    let inventory_calls = calls.to_service("inventory");
    assert_eq!(inventory_calls.len(), 1);
    assert_eq!(
        inventory_calls[0].representations(),
        &[
            json!({ "__typename": "Product", "upc": "1" }),
            json!({ "__typename": "Product", "upc": "2" }),
            json!({ "__typename": "Product", "upc": "3" }),
        ]
    );
    assert!(output.errors.is_empty());
    assert_eq!(
        output.data,
        Some(json!({
            "topProducts": [
                { "__typename": "Product", "upc": "1", "name": "Table", "inStock": true },
                { "__typename": "Product", "upc": "2", "name": "Couch", "inStock": false },
                { "__typename": "Product", "upc": "3", "name": "Chair", "inStock": true }
            ]
        }))
    );
}

#[tokio::test]
async fn nested_lists_are_resolved_at_their_concrete_positions() {
    let calls = Calls::default();
    let registry = registry(vec![
        (
            "reviews",
            service(&calls, Duration::ZERO, |_| {
                ServiceResult::from_data(json!({
                    "me": {
                        "reviews": [
                            { "author": { "__typename": "User", "id": "1" } },
                            { "author": null },
                            { "author": { "__typename": "User", "id": "2" } }
                        ]
                    }
                }))
            }),
        ),
        (
            "accounts",
            service(&calls, Duration::ZERO, |request| {
                entities(request, |representation| {
                    if representation["id"] == "2" {
                        Value::Null
                    } else {
                        json!({ "name": "Ada" })
                    }
                })
                .with_errors(vec![error_at("User 2 is gone", json!(["_entities", 1, "name"]))])
            }),
        ),
    ]);
    let plan = plan(json!({
        "kind": "Sequence",
        "nodes": [
            { "kind": "Fetch", "serviceName": "reviews", "operation": "{me{reviews{author{__typename id}}}}" },
            {
                "kind": "Flatten",
                "path": ["me", "reviews", "@", "author"],
                "node": {
                    "kind": "Fetch",
                    "serviceName": "accounts",
                    "requires": [
                        { "kind": "Field", "name": "__typename" },
                        { "kind": "Field", "name": "id" }
                    ],
                    "operation": "query($representations:[_Any!]!){_entities(representations:$representations){...on User{name}}}"
                }
            }
        ]
    }));

    let output =
        execute_query_plan(&plan, &registry, &no_variables(), &RequestContext::default()).await;

    assert_eq!(calls.to_service("accounts")[0].representations().len(), 2);
    assert_eq!(
        output.data,
        Some(json!({
            "me": {
                "reviews": [
                    { "author": { "__typename": "User", "id": "1", "name": "Ada" } },
                    { "author": null },
                    { "author": null }
                ]
            }
        }))
    );
    assert_eq!(output.errors.len(), 1);
    assert_eq!(
        output.errors[0].path,
        path(json!(["me", "reviews", 2, "author", "name"]))
    );
    assert_eq!(output.errors[0].service_name(), Some("accounts"));
}

#[tokio::test]
async fn partial_entity_failure_only_nulls_the_failing_position() {
    let calls = Calls::default();
    let registry = registry(vec![
        ("products", products_service(&calls)),
        (
            "reviews",
            service(&calls, Duration::ZERO, |request| {
                entities(request, |representation| match upc(representation) {
                    "2" => Value::Null,
                    other => json!({ "reviews": [{ "body": format!("Review of {}", other) }] }),
                })
                .with_errors(vec![error_at("Reviews are unavailable", json!(["_entities", 1]))])
            }),
        ),
    ]);
    let plan = plan(json!({
        "kind": "Sequence",
        "nodes": [top_products_fetch(), product_entities_fetch("reviews", "reviews{body}")]
    }));

    let output =
        execute_query_plan(&plan, &registry, &no_variables(), &RequestContext::default()).await;

    let data = output.data.unwrap();
    assert_eq!(data["topProducts"][0]["reviews"], json!([{ "body": "Review of 1" }]));
    assert_eq!(data["topProducts"][1], Value::Null);
    assert_eq!(data["topProducts"][2]["reviews"], json!([{ "body": "Review of 3" }]));
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].message, "Reviews are unavailable");
    assert_eq!(output.errors[0].path, path(json!(["topProducts", 1])));
    assert_eq!(
        output.errors[0].code(),
        Some(codes::DOWNSTREAM_SERVICE_ERROR)
    );
}

#[tokio::test]
async fn failing_branch_does_not_affect_its_siblings() {
    let calls = Calls::default();
    let registry = registry(vec![
        ("products", products_service(&calls)),
        (
            "accounts",
            LocalServiceEndpoint::new(|_| async {
                ServiceResult::failure(ServiceFailure::RequestFailure(
                    "connection refused".to_string(),
                ))
            })
            .to_boxed_arc(),
        ),
    ]);
    let plan = plan(json!({
        "kind": "Parallel",
        "nodes": [
            top_products_fetch(),
            { "kind": "Fetch", "serviceName": "accounts", "operation": "{me{id name}}" }
        ]
    }));

    let output =
        execute_query_plan(&plan, &registry, &no_variables(), &RequestContext::default()).await;

    let data = output.data.unwrap();
    assert_eq!(data["topProducts"], top_products()["topProducts"]);
    assert_eq!(data["me"], Value::Null);
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].path, path(json!(["me"])));
    assert_eq!(
        output.errors[0].code(),
        Some(codes::SERVICE_REQUEST_FAILURE)
    );
    assert_eq!(output.errors[0].service_name(), Some("accounts"));
}

#[tokio::test]
async fn failing_entity_batch_nulls_every_position_of_the_region() {
    let calls = Calls::default();
    let registry = registry(vec![
        ("products", products_service(&calls)),
        (
            "inventory",
            service(&calls, Duration::ZERO, |_| {
                ServiceResult::failure(ServiceFailure::MalformedResponse(
                    "expected value at line 1 column 1".to_string(),
                ))
            }),
        ),
    ]);
    let plan = plan(json!({
        "kind": "Sequence",
        "nodes": [top_products_fetch(), product_entities_fetch("inventory", "inStock")]
    }));

    let output =
        execute_query_plan(&plan, &registry, &no_variables(), &RequestContext::default()).await;

    assert_eq!(
        output.data,
        Some(json!({ "topProducts": [null, null, null] }))
    );
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].path, path(json!(["topProducts"])));
    assert_eq!(
        output.errors[0].code(),
        Some(codes::INVALID_SERVICE_RESPONSE)
    );
}

#[tokio::test]
async fn mismatched_entities_list_is_an_invalid_response() {
    let calls = Calls::default();
    let registry = registry(vec![
        ("products", products_service(&calls)),
        (
            "inventory",
            service(&calls, Duration::ZERO, |_| {
                ServiceResult::from_data(json!({ "_entities": [{ "inStock": true }] }))
            }),
        ),
    ]);
    let plan = plan(json!({
        "kind": "Sequence",
        "nodes": [top_products_fetch(), product_entities_fetch("inventory", "inStock")]
    }));

    let output =
        execute_query_plan(&plan, &registry, &no_variables(), &RequestContext::default()).await;

    assert_eq!(
        output.data,
        Some(json!({ "topProducts": [null, null, null] }))
    );
    assert_eq!(output.errors.len(), 1);
    assert_eq!(
        output.errors[0].message,
        "Service \"inventory\" returned an invalid entities list: expected 3 entities, received 1"
    );
}

#[tokio::test]
async fn scalar_entities_null_their_position() {
    let calls = Calls::default();
    let registry = registry(vec![
        ("products", products_service(&calls)),
        (
            "inventory",
            service(&calls, Duration::ZERO, |_| {
                ServiceResult::from_data(json!({ "_entities": [{ "inStock": true }, 1, "x"] }))
            }),
        ),
    ]);
    let plan = plan(json!({
        "kind": "Sequence",
        "nodes": [top_products_fetch(), product_entities_fetch("inventory", "inStock")]
    }));

    let output =
        execute_query_plan(&plan, &registry, &no_variables(), &RequestContext::default()).await;

    let data = output.data.unwrap();
    assert_eq!(data["topProducts"][0]["inStock"], json!(true));
    assert_eq!(data["topProducts"][1], Value::Null);
    assert_eq!(data["topProducts"][2], Value::Null);

    assert_eq!(output.errors.len(), 2);
    assert_eq!(output.errors[0].path, path(json!(["topProducts", 1])));
    assert_eq!(output.errors[1].path, path(json!(["topProducts", 2])));
    assert!(output
        .errors
        .iter()
        .all(|error| error.code() == Some(codes::INVALID_SERVICE_RESPONSE)));
    assert_eq!(
        output.errors[0].message,
        "Service \"inventory\" returned an invalid entities list: entity 1 is not an object"
    );
}

#[tokio::test]
async fn entities_without_data_report_the_service_errors() {
    let calls = Calls::default();
    let registry = registry(vec![
        ("products", products_service(&calls)),
        (
            "inventory",
            service(&calls, Duration::ZERO, |_| {
                ServiceResult::from_errors(vec![error_at(
                    "Warehouse is closed",
                    json!(["_entities", 0, "inStock"]),
                )])
            }),
        ),
    ]);
    let plan = plan(json!({
        "kind": "Sequence",
        "nodes": [top_products_fetch(), product_entities_fetch("inventory", "inStock")]
    }));

    let output =
        execute_query_plan(&plan, &registry, &no_variables(), &RequestContext::default()).await;

    assert_eq!(
        output.data,
        Some(json!({ "topProducts": [null, null, null] }))
    );
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].message, "Warehouse is closed");
    assert_eq!(
        output.errors[0].path,
        path(json!(["topProducts", 0, "inStock"]))
    );
}

#[tokio::test]
async fn incomplete_entities_are_skipped_without_errors() {
    let calls = Calls::default();
    let registry = registry(vec![
        (
            "products",
            service(&calls, Duration::ZERO, |_| {
                ServiceResult::from_data(json!({
                    "topProducts": [
                        { "__typename": "Product", "upc": "1" },
                        null,
                        { "__typename": "Product", "name": "No upc" },
                        { "__typename": "Product", "upc": null }
                    ]
                }))
            }),
        ),
        (
            "inventory",
            service(&calls, Duration::ZERO, |request| {
                entities(request, |_| json!({ "inStock": true }))
            }),
        ),
    ]);
    let plan = plan(json!({
        "kind": "Sequence",
        "nodes": [top_products_fetch(), product_entities_fetch("inventory", "inStock")]
    }));

    let output =
        execute_query_plan(&plan, &registry, &no_variables(), &RequestContext::default()).await;

    assert!(output.errors.is_empty());
    assert_eq!(
        calls.to_service("inventory")[0].representations(),
        &[json!({ "__typename": "Product", "upc": "1" })]
    );
    assert_eq!(
        output.data,
        Some(json!({
            "topProducts": [
                { "__typename": "Product", "upc": "1", "inStock": true },
                null,
                { "__typename": "Product", "name": "No upc" },
                { "__typename": "Product", "upc": null }
            ]
        }))
    );
}

#[tokio::test]
async fn cancellation_keeps_completed_regions() {
    let calls = Calls::default();
    let slow_call_finished = Arc::new(AtomicBool::new(false));
    let finished = slow_call_finished.clone();
    let registry = registry(vec![
        ("products", products_service(&calls)),
        (
            "reviews",
            service(&calls, Duration::ZERO, |request| {
                entities(request, |_| json!({ "reviews": [] }))
            }),
        ),
        (
            "inventory",
            LocalServiceEndpoint::new(move |_| {
                let finished = finished.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    finished.store(true, Ordering::SeqCst);
                    ServiceResult::from_data(json!({ "_entities": [] }))
                }
            })
            .to_boxed_arc(),
        ),
    ]);
    let plan = plan(json!({
        "kind": "Sequence",
        "nodes": [
            top_products_fetch(),
            {
                "kind": "Parallel",
                "nodes": [
                    product_entities_fetch("reviews", "reviews{body}"),
                    product_entities_fetch("inventory", "inStock")
                ]
            },
            { "kind": "Fetch", "serviceName": "products", "operation": "{bestSellers{upc}}" }
        ]
    }));

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let variables = Map::new();
    let output = QueryPlanExecutor::new(&registry, &ExecutionConfig::default())
        .run(&plan, &variables, &RequestContext::default(), token)
        .await;
    assert!(started.elapsed() < Duration::from_millis(250));

    let data = output.data.unwrap();
    assert_eq!(data["topProducts"][0]["reviews"], json!([]));
    assert_eq!(data["topProducts"][0]["name"], json!("Table"));
    assert!(data["topProducts"][0].get("inStock").is_none());

    let error_codes: Vec<Option<&str>> = output.errors.iter().map(|error| error.code()).collect();
    assert_eq!(
        error_codes,
        vec![
            Some(codes::EXECUTION_CANCELLED),
            Some(codes::EXECUTION_CANCELLED)
        ]
    );
    assert_eq!(output.errors[0].service_name(), Some("inventory"));
    assert_eq!(output.errors[0].path, path(json!(["topProducts"])));
    assert_eq!(output.errors[1].service_name(), Some("products"));
    assert_eq!(output.errors[1].path, path(json!(["bestSellers"])));

    // The abandoned call was dropped, not left running in the background.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!slow_call_finished.load(Ordering::SeqCst));
}

#[tokio::test]
async fn execution_timeout_is_reported_per_incomplete_region() {
    let calls = Calls::default();
    let registry = registry(vec![
        ("products", products_service(&calls)),
        (
            "inventory",
            service(&calls, Duration::from_secs(5), |request| {
                entities(request, |_| json!({ "inStock": true }))
            }),
        ),
    ]);
    let plan = plan(json!({
        "kind": "Sequence",
        "nodes": [top_products_fetch(), product_entities_fetch("inventory", "inStock")]
    }));
    let config = ExecutionConfig {
        timeout: Some(Duration::from_millis(50)),
    };

    let started = Instant::now();
    let variables = Map::new();
    let output = QueryPlanExecutor::new(&registry, &config)
        .run(
            &plan,
            &variables,
            &RequestContext::default(),
            CancellationToken::new(),
        )
        .await;

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(output.data, Some(top_products()));
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].code(), Some(codes::EXECUTION_TIMEOUT));
}

#[tokio::test]
async fn forwards_variables_and_request_context() {
    let calls = Calls::default();
    let registry = registry(vec![
        (
            "accounts",
            service(&calls, Duration::ZERO, |_| {
                ServiceResult::from_data(json!({ "me": { "id": "1", "friendIds": ["2", "3"] } }))
            }),
        ),
        (
            "reviews",
            service(&calls, Duration::ZERO, |_| {
                ServiceResult::from_data(json!({ "reviewsByAuthors": [] }))
            }),
        ),
    ]);
    let plan = plan(json!({
        "kind": "Sequence",
        "nodes": [
            {
                "kind": "Fetch",
                "serviceName": "accounts",
                "operationName": "Me",
                "variableUsages": ["locale", "missing"],
                "operation": "query Me($locale:String){me{id friendIds}}"
            },
            {
                "kind": "Fetch",
                "serviceName": "reviews",
                "variableUsages": [
                    "first",
                    { "name": "authorId", "path": ["me", "id"] },
                    { "name": "friendIds", "path": ["me", "friendIds", "@"] }
                ],
                "operation": "query($first:Int,$authorId:ID,$friendIds:[ID]){reviewsByAuthors(first:$first,id:$authorId,friends:$friendIds){body}}"
            }
        ]
    }));
    let mut variables = Map::new();
    variables.insert("locale".to_string(), json!("en"));
    variables.insert("first".to_string(), json!(5));
    let mut request_context = RequestContext::default();
    request_context
        .headers
        .insert("authorization", "Bearer secret".parse().unwrap());
    request_context
        .extensions
        .insert("clientName".to_string(), json!("storefront"));

    let output = execute_query_plan(&plan, &registry, &variables, &request_context).await;
    assert!(output.errors.is_empty());

    let accounts_call = &calls.to_service("accounts")[0];
    assert_eq!(accounts_call.operation_name.as_deref(), Some("Me"));
    assert_eq!(
        Value::Object(accounts_call.variables.clone()),
        json!({ "locale": "en" })
    );
    assert_eq!(
        accounts_call.headers.get("authorization").unwrap(),
        "Bearer secret"
    );
    assert_eq!(
        accounts_call.extensions.get("clientName"),
        Some(&json!("storefront"))
    );

    let reviews_call = &calls.to_service("reviews")[0];
    assert_eq!(
        Value::Object(reviews_call.variables.clone()),
        json!({ "first": 5, "authorId": "1", "friendIds": ["2", "3"] })
    );
    assert_eq!(
        Value::Object(reviews_call.extensions.clone()),
        json!({ "clientName": "storefront" })
    );
}

#[tokio::test]
async fn configuration_errors_only_affect_their_region() {
    let calls = Calls::default();
    let registry = registry(vec![("products", products_service(&calls))]);
    let plan = plan(json!({
        "kind": "Parallel",
        "nodes": [
            top_products_fetch(),
            { "kind": "Fetch", "serviceName": "inventory", "operation": "{warehouses{id} stores{id}}" },
            {
                "kind": "Flatten",
                "path": ["topProducts", "@"],
                "node": { "kind": "Sequence", "nodes": [] }
            }
        ]
    }));

    let output =
        execute_query_plan(&plan, &registry, &no_variables(), &RequestContext::default()).await;

    assert_eq!(
        output.data,
        Some(json!({
            "topProducts": top_products()["topProducts"],
            "warehouses": null,
            "stores": null
        }))
    );
    assert_eq!(output.errors.len(), 2);
    let not_found = output
        .errors
        .iter()
        .find(|error| error.code() == Some(codes::SERVICE_NOT_FOUND))
        .unwrap();
    assert_eq!(not_found.path, None);
    assert_eq!(not_found.message, "Service \"inventory\" is not registered");
    let invalid_plan = output
        .errors
        .iter()
        .find(|error| error.code() == Some(codes::INVALID_QUERY_PLAN))
        .unwrap();
    assert_eq!(invalid_plan.path, path(json!(["topProducts"])));
}

#[tokio::test]
async fn flatten_without_requires_is_an_invalid_plan() {
    let calls = Calls::default();
    let registry = registry(vec![
        ("products", products_service(&calls)),
        (
            "reviews",
            service(&calls, Duration::ZERO, |request| {
                entities(request, |_| json!({ "reviews": [] }))
            }),
        ),
    ]);
    let plan = plan(json!({
        "kind": "Sequence",
        "nodes": [
            top_products_fetch(),
            {
                "kind": "Flatten",
                "path": ["topProducts", "@"],
                "node": {
                    "kind": "Fetch",
                    "serviceName": "reviews",
                    "operation": "{_entities(representations:$representations){...on Product{reviews{body}}}}"
                }
            }
        ]
    }));

    let output =
        execute_query_plan(&plan, &registry, &no_variables(), &RequestContext::default()).await;

    assert_eq!(output.data, Some(top_products()));
    assert!(calls.to_service("reviews").is_empty());
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].code(), Some(codes::INVALID_QUERY_PLAN));
    assert_eq!(output.errors[0].path, path(json!(["topProducts"])));
    assert!(output.errors[0].message.contains("\"reviews\""));
}

#[tokio::test]
async fn root_failure_without_any_data_returns_null_data() {
    let registry = registry(vec![(
        "products",
        LocalServiceEndpoint::new(|_| async {
            ServiceResult::failure(ServiceFailure::Timeout(Duration::from_secs(1)))
        })
        .to_boxed_arc(),
    )]);
    let plan = plan(json!({
        "kind": "Fetch",
        "serviceName": "products",
        "operation": "{ ...Top }\nfragment Top on Query { topProducts { upc } }"
    }));

    let output =
        execute_query_plan(&plan, &registry, &no_variables(), &RequestContext::default()).await;

    assert_eq!(output.data, Some(json!({ "topProducts": null })));
    assert_eq!(output.errors[0].code(), Some(codes::SERVICE_TIMEOUT));
    assert_eq!(output.errors[0].path, path(json!(["topProducts"])));

    let empty_operation = self::fixtures::plan(json!({
        "kind": "Fetch",
        "serviceName": "products",
        "operation": "not a graphql document"
    }));
    let output = execute_query_plan(
        &empty_operation,
        &registry,
        &no_variables(),
        &RequestContext::default(),
    )
    .await;
    assert_eq!(output.data, None);
    assert_eq!(
        output.to_value(),
        json!({
            "data": null,
            "errors": [{
                "message": "Request to service \"products\" failed: Request timed out after 1s",
                "extensions": { "code": "SERVICE_TIMEOUT", "serviceName": "products" }
            }]
        })
    );
}

#[tokio::test]
async fn root_entity_fetch_reads_representations_from_the_root() {
    let calls = Calls::default();
    let registry = registry(vec![
        (
            "accounts",
            service(&calls, Duration::ZERO, |_| {
                ServiceResult::from_data(json!({ "__typename": "Query", "id": "root" }))
            }),
        ),
        (
            "extras",
            service(&calls, Duration::ZERO, |request| {
                entities(request, |_| json!({ "featured": ["1"] }))
            }),
        ),
    ]);
    let plan = plan(json!({
        "kind": "Sequence",
        "nodes": [
            { "kind": "Fetch", "serviceName": "accounts", "operation": "{__typename id}" },
            {
                "kind": "Fetch",
                "serviceName": "extras",
                "requires": [{ "kind": "Field", "name": "__typename" }],
                "operation": "query($representations:[_Any!]!){_entities(representations:$representations){...on Query{featured}}}"
            }
        ]
    }));

    let output =
        execute_query_plan(&plan, &registry, &no_variables(), &RequestContext::default()).await;

    assert!(output.errors.is_empty());
    assert_eq!(
        calls.to_service("extras")[0].representations(),
        &[json!({ "__typename": "Query" })]
    );
    assert_eq!(
        output.data,
        Some(json!({ "__typename": "Query", "id": "root", "featured": ["1"] }))
    );
}

#[tokio::test]
async fn empty_plan_produces_empty_data() {
    let registry = registry(vec![]);
    let output = execute_query_plan(
        &crate::QueryPlan::default(),
        &registry,
        &no_variables(),
        &RequestContext::default(),
    )
    .await;
    assert_eq!(output.to_value(), json!({ "data": {} }));
}
