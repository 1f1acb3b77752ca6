//! Shared model fixtures for unit tests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{FieldDef, Model, ModelState};

macro_rules! fixture_model {
    ($ty:ident, $name:literal, $fields:ident) => {
        fixture_model!($ty, $name, $fields, false);
    };
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
fixture_model!(Country, "Country", COUNTRY_FIELDS);

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
fixture_model!(User, "User", USER_FIELDS);

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub bio: String,
    #[serde(skip)]
    pub state: ModelState,
}

static PROFILE_FIELDS: &[FieldDef] =
    &[FieldDef::new("id"), FieldDef::new("user_id"), FieldDef::new("bio")];
fixture_model!(Profile, "Profile", PROFILE_FIELDS);

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
fixture_model!(Post, "Post", POST_FIELDS, true);

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub body: String,
    pub approved: bool,
    #[serde(skip)]
    pub state: ModelState,
}

static COMMENT_FIELDS: &[FieldDef] = &[
    FieldDef::new("id"),
    FieldDef::new("post_id"),
    FieldDef::new("body"),
    FieldDef::new("approved"),
];
fixture_model!(Comment, "Comment", COMMENT_FIELDS);

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    #[serde(skip)]
    pub state: ModelState,
}

static TAG_FIELDS: &[FieldDef] = &[FieldDef::new("id"), FieldDef::new("name")];
fixture_model!(Tag, "Tag", TAG_FIELDS);

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
fixture_model!(Image, "Image", IMAGE_FIELDS);
