#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use elif_relations::{
    DatabaseValue, FieldDef, Model, ModelState, OrmConfig, OrmContext, Relationship, ValueRow,
};

macro_rules! model {
    ($ty:ident, $name:literal, $fields:ident, $soft:literal) => {
        impl Model for $ty {
            fn model_name() -> &'static str {
                $name
            }
            fn fields() -> &'static [FieldDef] {
                $fields
            }
            fn state(&self) -> &ModelState {
                &self.state
            }
            fn state_mut(&mut self) -> &mut ModelState {
                &mut self.state
            }
            fn uses_soft_deletes() -> bool {
                $soft
            }
        }
    };
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    pub name: String,
    #[serde(skip)]
    pub state: ModelState,
}

static COUNTRY_FIELDS: &[FieldDef] = &[FieldDef::new("id"), FieldDef::new("name")];
model!(Country, "Country", COUNTRY_FIELDS, false);

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
    pub country_id: Option<i64>,
    #[serde(skip)]
    pub state: ModelState,
}

static USER_FIELDS: &[FieldDef] = &[
    FieldDef::new("id").nullable(),
    FieldDef::new("name"),
    FieldDef::new("country_id").nullable(),
];
model!(User, "User", USER_FIELDS, false);

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Post {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub title: String,
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub state: ModelState,
}

static POST_FIELDS: &[FieldDef] = &[
    FieldDef::new("id").nullable(),
    FieldDef::new("user_id").nullable(),
    FieldDef::new("title"),
    FieldDef::new("deleted_at").nullable(),
];
model!(Post, "Post", POST_FIELDS, true);

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub body: String,
    #[serde(skip)]
    pub state: ModelState,
}

static COMMENT_FIELDS: &[FieldDef] =
    &[FieldDef::new("id"), FieldDef::new("post_id"), FieldDef::new("body")];
model!(Comment, "Comment", COMMENT_FIELDS, false);

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    #[serde(skip)]
    pub state: ModelState,
}

static TAG_FIELDS: &[FieldDef] = &[FieldDef::new("id"), FieldDef::new("name")];
model!(Tag, "Tag", TAG_FIELDS, false);

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub url: String,
    pub imageable_type: String,
    pub imageable_id: i64,
    #[serde(skip)]
    pub state: ModelState,
}

static IMAGE_FIELDS: &[FieldDef] = &[
    FieldDef::new("id"),
    FieldDef::new("url"),
    FieldDef::new("imageable_type"),
    FieldDef::new("imageable_id"),
];
model!(Image, "Image", IMAGE_FIELDS, false);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Context with every fixture relation registered
pub fn context_with(config: OrmConfig) -> OrmContext {
    init_tracing();
    let ctx = OrmContext::with_config(config).expect("valid config");

    ctx.register_relationship::<User, _>("posts", || Relationship::has_many::<User, Post>("", ""));
    ctx.register_relationship::<User, _>("country", || {
        Relationship::belongs_to::<User, Country>("", "")
    });
    ctx.register_relationship::<Post, _>("user", || Relationship::belongs_to::<Post, User>("", ""));
    ctx.register_relationship::<Post, _>("comments", || {
        Relationship::has_many::<Post, Comment>("", "").order_by("id")
    });
    ctx.register_relationship::<Post, _>("tags", || {
        Relationship::belongs_to_many::<Post, Tag>("", "", "")
    });
    ctx.register_relationship::<Post, _>("images", || {
        Relationship::morph_many::<Post, Image>("imageable", "", "", "")
    });
    ctx.register_relationship::<Country, _>("posts", || {
        Relationship::has_many_through::<Country, Post, User>("", "", "", "")
    });
    ctx.register_relationship::<Image, _>("imageable", || {
        Relationship::morph_to::<Image>("imageable", "", "", "")
    });

    ctx.register_morph_type::<Post>();
    ctx.register_morph_type::<User>();
    ctx
}

pub fn context() -> OrmContext {
    context_with(OrmConfig::default())
}

pub fn user(id: i64) -> User {
    User {
        id: Some(id),
        name: format!("user {}", id),
        ..Default::default()
    }
}

pub fn post(id: i64, user_id: i64) -> Post {
    Post {
        id: Some(id),
        user_id: Some(user_id),
        title: format!("post {}", id),
        ..Default::default()
    }
}

pub fn post_row(id: i64, user_id: i64) -> ValueRow {
    ValueRow::new()
        .with("id", id)
        .with("user_id", user_id)
        .with("title", format!("post {}", id))
        .with("deleted_at", DatabaseValue::Null)
}

pub fn user_row(id: i64) -> ValueRow {
    ValueRow::new().with("id", id).with("name", format!("user {}", id))
}

pub fn comment_row(id: i64, post_id: i64) -> ValueRow {
    ValueRow::new()
        .with("id", id)
        .with("post_id", post_id)
        .with("body", format!("comment {}", id))
}
