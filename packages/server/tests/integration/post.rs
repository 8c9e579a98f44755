use chrono::{Local, TimeZone, Utc};
use serde_json::json;

use crate::common::{NOW_MILLIS, TestApp, routes};

fn today() -> String {
    Utc.timestamp_millis_opt(NOW_MILLIS)
        .unwrap()
        .with_timezone(&Local)
        .format("%m-%d")
        .to_string()
}

mod post_creation {
    use super::*;

    #[tokio::test]
    async fn empty_post_gets_derived_fields() {
        let app = TestApp::spawn().await;

        let res = app.post(routes::POSTS, &json!({ "content": "" })).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["title"], "default title");
        assert_eq!(res.body["slug"], "default-title");
        assert_eq!(res.body["reading_time"], "0");
        assert_eq!(res.body["ctime"], NOW_MILLIS);
        assert_eq!(res.body["date"], today());
        assert_eq!(res.body["tag_ids"], json!([]));
        assert!(res.body["attachment_id"].is_null());
    }

    #[tokio::test]
    async fn supplied_ctime_keeps_submitted_date() {
        let app = TestApp::spawn().await;

        let res = app
            .post(routes::POSTS, &json!({ "title": "Old", "ctime": 1000 }))
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["ctime"], 1000);
        assert_eq!(res.body["date"], "");

        let res = app
            .post(
                routes::POSTS,
                &json!({ "title": "Older", "ctime": 1000, "date": "12-25" }),
            )
            .await;
        assert_eq!(res.body["date"], "12-25");
    }

    #[tokio::test]
    async fn reading_time_counts_whole_minutes() {
        let app = TestApp::spawn().await;
        let content = vec!["word"; 450].join(" ");

        let res = app
            .post(routes::POSTS, &json!({ "title": "Long", "content": content }))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["reading_time"], "2");
    }

    #[tokio::test]
    async fn derived_slugs_are_deduplicated() {
        let app = TestApp::spawn().await;

        let first = app
            .post(routes::POSTS, &json!({ "title": "Hello World" }))
            .await;
        let second = app
            .post(routes::POSTS, &json!({ "title": "Hello World" }))
            .await;

        assert_eq!(first.body["slug"], "hello-world");
        assert_eq!(second.body["slug"], "hello-world-2");
    }

    #[tokio::test]
    async fn explicit_duplicate_slug_conflicts() {
        let app = TestApp::spawn().await;

        let res = app
            .post(routes::POSTS, &json!({ "title": "A", "slug": "same" }))
            .await;
        assert_eq!(res.status, 201);

        let res = app
            .post(routes::POSTS, &json!({ "title": "B", "slug": "same" }))
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn invalid_input_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post(routes::POSTS, &json!({ "slug": "Not Valid" }))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");

        let res = app.post(routes::POSTS, &json!({ "title": "   " })).await;
        assert_eq!(res.status, 400);

        let res = app.post(routes::POSTS, &json!({ "ctime": -5 })).await;
        assert_eq!(res.status, 400);

        let res = app.post_raw(routes::POSTS, "{ not json").await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_relations_are_rejected() {
        let app = TestApp::spawn().await;

        let res = app.post(routes::POSTS, &json!({ "tag_ids": [99] })).await;
        assert_eq!(res.status, 400, "{}", res.text);

        let res = app.post(routes::POSTS, &json!({ "category_id": 99 })).await;
        assert_eq!(res.status, 400, "{}", res.text);

        let res = app
            .post(routes::POSTS, &json!({ "next_article_id": 99 }))
            .await;
        assert_eq!(res.status, 400, "{}", res.text);

        let list = app.get(routes::POSTS).await;
        assert_eq!(list.body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn create_with_tags_and_category() {
        let app = TestApp::spawn().await;
        let rust = app.create_tag("rust").await;
        let web = app.create_tag("web").await;
        let notes = app.create_category("notes").await;

        let res = app
            .post(
                routes::POSTS,
                &json!({ "title": "Tagged", "tag_ids": [web, rust], "category_id": notes }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["tag_ids"], json!([rust, web]));
        assert_eq!(res.body["category_id"], notes);
    }
}

mod post_reading {
    use super::*;

    #[tokio::test]
    async fn get_by_id_and_slug() {
        let app = TestApp::spawn().await;
        let id = app.create_post("Find Me").await;

        let by_id = app.get(&routes::post(id)).await;
        assert_eq!(by_id.status, 200);
        assert_eq!(by_id.body["slug"], "find-me");
        assert_eq!(by_id.body["content"], "Some words here.");

        let by_slug = app.get(&routes::post_by_slug("find-me")).await;
        assert_eq!(by_slug.status, 200);
        assert_eq!(by_slug.id(), id);

        assert_eq!(app.get(&routes::post(id + 100)).await.status, 404);
        let missing = app.get(&routes::post_by_slug("nope")).await;
        assert_eq!(missing.status, 404);
        assert_eq!(missing.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn list_is_paginated_and_filterable() {
        let app = TestApp::spawn().await;
        let tag = app.create_tag("rust").await;
        let category = app.create_category("notes").await;

        for i in 0..3 {
            app.create_post(&format!("Plain {i}")).await;
        }
        let tagged = app
            .post(routes::POSTS, &json!({ "title": "Tagged", "tag_ids": [tag] }))
            .await
            .id();
        let filed = app
            .post(
                routes::POSTS,
                &json!({ "title": "Filed", "category_id": category }),
            )
            .await
            .id();

        let page = app
            .get(&format!("{}?page=2&per_page=2", routes::POSTS))
            .await;
        assert_eq!(page.status, 200);
        assert_eq!(page.body["pagination"]["total"], 5);
        assert_eq!(page.body["pagination"]["total_pages"], 3);
        assert_eq!(page.body["data"].as_array().unwrap().len(), 2);
        assert!(page.body["data"][0].get("content").is_none());

        let by_tag = app
            .get(&format!("{}?tag_id={tag}", routes::POSTS))
            .await;
        assert_eq!(by_tag.body["pagination"]["total"], 1);
        assert_eq!(by_tag.body["data"][0]["id"], tagged);

        let by_category = app
            .get(&format!("{}?category_id={category}", routes::POSTS))
            .await;
        assert_eq!(by_category.body["pagination"]["total"], 1);
        assert_eq!(by_category.body["data"][0]["id"], filed);
    }
}

mod post_update {
    use super::*;

    #[tokio::test]
    async fn update_never_rederives_fields() {
        let app = TestApp::spawn().await;
        let id = app.create_post("Stable").await;
        let before = app.fetch_post(id).await;

        let long = vec!["word"; 1000].join(" ");
        let res = app
            .patch(&routes::post(id), &json!({ "content": long.clone() }))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["content"], long);
        assert_eq!(res.body["reading_time"], before["reading_time"]);
        assert_eq!(res.body["ctime"], before["ctime"]);
        assert_eq!(res.body["date"], before["date"]);
    }

    #[tokio::test]
    async fn patch_replaces_tags_and_clears_category() {
        let app = TestApp::spawn().await;
        let a = app.create_tag("a").await;
        let b = app.create_tag("b").await;
        let category = app.create_category("c").await;
        let id = app
            .post(
                routes::POSTS,
                &json!({ "title": "P", "tag_ids": [a], "category_id": category }),
            )
            .await
            .id();

        let res = app
            .patch(
                &routes::post(id),
                &json!({ "tag_ids": [b], "category_id": null }),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["tag_ids"], json!([b]));
        assert!(res.body["category_id"].is_null());
    }

    #[tokio::test]
    async fn empty_patch_returns_current_post() {
        let app = TestApp::spawn().await;
        let id = app.create_post("Same").await;

        let res = app.patch(&routes::post(id), &json!({})).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["title"], "Same");

        assert_eq!(app.patch(&routes::post(999), &json!({})).await.status, 404);
    }

    #[tokio::test]
    async fn slug_change_to_taken_slug_conflicts() {
        let app = TestApp::spawn().await;
        app.create_post("First").await;
        let second = app.create_post("Second").await;

        let res = app
            .patch(&routes::post(second), &json!({ "slug": "first" }))
            .await;
        assert_eq!(res.status, 409);

        let res = app
            .patch(&routes::post(second), &json!({ "slug": "second" }))
            .await;
        assert_eq!(res.status, 200);
    }
}

mod neighbour_links {
    use super::*;

    #[tokio::test]
    async fn setting_next_sets_partner_prev() {
        let app = TestApp::spawn().await;
        let a = app.create_post("A").await;
        let b = app.create_post("B").await;

        let res = app
            .patch(&routes::post(a), &json!({ "next_article_id": b }))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["next_article_id"], b);
        assert_eq!(app.fetch_post(b).await["prev_article_id"], a);
    }

    #[tokio::test]
    async fn relinking_detaches_old_partners() {
        let app = TestApp::spawn().await;
        let a = app.create_post("A").await;
        let b = app.create_post("B").await;
        let c = app.create_post("C").await;

        app.patch(&routes::post(a), &json!({ "next_article_id": b }))
            .await;
        let res = app
            .patch(&routes::post(c), &json!({ "next_article_id": b }))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        assert!(app.fetch_post(a).await["next_article_id"].is_null());
        assert_eq!(app.fetch_post(b).await["prev_article_id"], c);
        assert_eq!(app.fetch_post(c).await["next_article_id"], b);

        let res = app
            .patch(&routes::post(b), &json!({ "prev_article_id": null }))
            .await;
        assert_eq!(res.status, 200);
        assert!(app.fetch_post(c).await["next_article_id"].is_null());
    }

    #[tokio::test]
    async fn create_links_to_existing_posts() {
        let app = TestApp::spawn().await;
        let a = app.create_post("A").await;

        let res = app
            .post(
                routes::POSTS,
                &json!({ "title": "B", "prev_article_id": a }),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(app.fetch_post(a).await["next_article_id"], res.id());
    }

    #[tokio::test]
    async fn self_link_is_rejected() {
        let app = TestApp::spawn().await;
        let a = app.create_post("A").await;

        let res = app
            .patch(&routes::post(a), &json!({ "prev_article_id": a }))
            .await;
        assert_eq!(res.status, 400);
        assert!(app.fetch_post(a).await["prev_article_id"].is_null());
    }
}

mod post_deletion {
    use super::*;

    #[tokio::test]
    async fn delete_detaches_references() {
        let app = TestApp::spawn().await;
        let tag = app.create_tag("t").await;
        let a = app.create_post("A").await;
        let b = app
            .post(
                routes::POSTS,
                &json!({ "title": "B", "tag_ids": [tag], "prev_article_id": a }),
            )
            .await
            .id();
        let c = app.create_post("C").await;
        app.patch(&routes::post(b), &json!({ "next_article_id": c }))
            .await;

        let res = app.delete(&routes::post(b)).await;
        assert_eq!(res.status, 204);

        assert_eq!(app.get(&routes::post(b)).await.status, 404);
        assert!(app.fetch_post(a).await["next_article_id"].is_null());
        assert!(app.fetch_post(c).await["prev_article_id"].is_null());
        assert_eq!(app.get(&routes::tag(tag)).await.body["post_ids"], json!([]));

        assert_eq!(app.delete(&routes::post(b)).await.status, 404);
    }
}
