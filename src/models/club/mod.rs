use async_graphql::{ComplexObject, Context, Enum, InputObject, Result, SimpleObject};
use futures_util::TryStreamExt;
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::models::club::membership::Membership;
use crate::models::profile::Profile;
use crate::models::TimeScalar;

pub mod membership;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Enum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Sports,
    PerformingArts,
    ClubsAndSocieties,
    UniformedGroups,
    Other,
}

/// How members are expected to take part in a club
#[derive(Clone, Copy, Debug, PartialEq, Eq, Enum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitmentModel {
    /// Meets on a fixed weekly schedule
    ScheduleBased,
    /// Members come and go as they like
    Flexible,
    /// Only meets for events
    EventBased,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Enum, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// A weekly meeting slot
#[derive(SimpleObject, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlot {
    pub day: DayOfWeek,
    /// Formatted as `HH:MM`
    pub start_time: String,
    /// Formatted as `HH:MM`
    pub end_time: String,
    pub location: String,
}

/// A free-form section of a club's page
#[derive(SimpleObject, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ContentBlock {
    pub heading: Option<String>,
    pub body: String,
}

/// A co-curricular activity students can join
#[derive(SimpleObject, Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
#[graphql(complex)]
pub struct Club {
    #[serde(rename = "_id")]
    #[graphql(skip)]
    pub id: ObjectId,
    /// The name of the club
    pub name: String,
    /// What the club is about
    pub description: Option<String>,
    pub category: Category,
    pub commitment: CommitmentModel,
    /// When the club meets, only for schedule-based clubs
    #[serde(default)]
    pub schedule: Vec<ScheduleSlot>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    /// A link to the club's picture
    pub image_url: Option<String>,
}

#[ComplexObject]
impl Club {
    /// The ID of the club
    pub async fn id(&self) -> String {
        self.id.to_hex()
    }

    /// How many members the club has
    pub async fn member_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let pool: &PgPool = ctx.data_unchecked();
        Membership::count_for_club(&self.id.to_hex(), pool).await
    }

    /// The club admin running the club, if any
    pub async fn admin(&self, ctx: &Context<'_>) -> Result<Option<Profile>> {
        let pool: &PgPool = ctx.data_unchecked();
        Profile::admin_of_club(&self.id.to_hex(), pool).await
    }
}

impl Club {
    fn collection(database: &Database) -> Collection<Club> {
        database.collection("clubs")
    }

    pub async fn setup_collection(database: &Database) -> Result<(), mongodb::error::Error> {
        Self::collection(database)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name": 1 })
                    .options(Some(IndexOptions::builder().unique(Some(true)).build()))
                    .build(),
                None,
            )
            .await?;

        Ok(())
    }

    pub async fn with_id(id: &str, database: &Database) -> Result<Self> {
        Self::with_id_opt(id, database)
            .await?
            .ok_or_else(|| format!("No club with id {}", id).into())
    }

    /// Malformed IDs are treated as missing clubs
    pub async fn with_id_opt(id: &str, database: &Database) -> Result<Option<Self>> {
        let id = match ObjectId::parse_str(id) {
            Ok(id) => id,
            Err(_) => return Ok(None),
        };

        Self::collection(database)
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(Into::into)
    }

    pub async fn all(database: &Database) -> Result<Vec<Self>> {
        let options = FindOptions::builder().sort(doc! { "name": 1 }).build();

        Self::collection(database)
            .find(None, options)
            .await?
            .try_collect()
            .await
            .map_err(Into::into)
    }

    pub async fn with_ids(ids: &[String], database: &Database) -> Result<Vec<Self>> {
        let ids: Vec<ObjectId> = ids
            .iter()
            .filter_map(|id| ObjectId::parse_str(id).ok())
            .collect();
        let options = FindOptions::builder().sort(doc! { "name": 1 }).build();

        Self::collection(database)
            .find(doc! { "_id": { "$in": ids } }, options)
            .await?
            .try_collect()
            .await
            .map_err(Into::into)
    }

    pub async fn create(new_club: NewClub, database: &Database) -> Result<Self> {
        let club = new_club.into_club(ObjectId::new())?;
        Self::collection(database).insert_one(&club, None).await?;

        Ok(club)
    }

    pub async fn update(id: &str, update: NewClub, database: &Database) -> Result<Self> {
        let existing = Self::with_id(id, database).await?;
        let club = update.into_club(existing.id)?;

        Self::collection(database)
            .replace_one(doc! { "_id": existing.id }, &club, None)
            .await?;

        Ok(club)
    }

    /// Returns whether a club was deleted
    pub async fn delete(id: &str, database: &Database) -> Result<bool> {
        let id = match ObjectId::parse_str(id) {
            Ok(id) => id,
            Err(_) => return Ok(false),
        };

        let result = Self::collection(database)
            .delete_one(doc! { "_id": id }, None)
            .await?;

        Ok(result.deleted_count == 1)
    }
}

#[derive(InputObject, Clone)]
pub struct NewScheduleSlot {
    pub day: DayOfWeek,
    pub start_time: TimeScalar,
    pub end_time: TimeScalar,
    pub location: String,
}

#[derive(InputObject, Clone)]
pub struct NewContentBlock {
    pub heading: Option<String>,
    pub body: String,
}

#[derive(InputObject, Clone)]
pub struct NewClub {
    pub name: String,
    pub description: Option<String>,
    pub category: Category,
    pub commitment: CommitmentModel,
    #[graphql(default)]
    pub schedule: Vec<NewScheduleSlot>,
    #[graphql(default)]
    pub content: Vec<NewContentBlock>,
    pub image_url: Option<String>,
}

impl NewClub {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Clubs must have a name".to_owned());
        }

        if self.commitment != CommitmentModel::ScheduleBased && !self.schedule.is_empty() {
            return Err("Only schedule-based clubs can have a weekly schedule".to_owned());
        }

        for slot in &self.schedule {
            if slot.end_time <= slot.start_time {
                return Err(format!("The {:?} slot must end after it starts", slot.day));
            }
        }

        Ok(())
    }

    pub fn into_club(self, id: ObjectId) -> std::result::Result<Club, String> {
        self.validate()?;

        Ok(Club {
            id,
            name: self.name.trim().to_owned(),
            description: self.description,
            category: self.category,
            commitment: self.commitment,
            schedule: self
                .schedule
                .into_iter()
                .map(|slot| ScheduleSlot {
                    day: slot.day,
                    start_time: slot.start_time.to_string(),
                    end_time: slot.end_time.to_string(),
                    location: slot.location,
                })
                .collect(),
            content: self
                .content
                .into_iter()
                .map(|block| ContentBlock {
                    heading: block.heading,
                    body: block.body,
                })
                .collect(),
            image_url: self.image_url,
        })
    }
}
