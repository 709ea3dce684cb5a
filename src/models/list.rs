use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A user-owned movie list. The two system lists ("Favorites", "Watched")
/// are flagged `is_system` and managed by the engagement engine.
/// (name, created_by) is unique.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lists")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String, // UUID
    pub name: String,
    pub description: Option<String>,
    pub created_by: i32,
    pub is_public: bool,
    pub is_system: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(has_many = "super::movie_in_list::Entity")]
    MovieInList,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::movie_in_list::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieInList.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
