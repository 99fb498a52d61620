use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "shows")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub total_seasons: i32,
    pub platform_id: i32,
    /// Display flag only; watch links are left alone when it flips.
    #[sea_orm(default_value = false)]
    pub cancelled: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::platforms::Entity",
        from = "Column::PlatformId",
        to = "super::platforms::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Platforms,
    #[sea_orm(has_many = "super::shows_to_users::Entity")]
    ShowsToUsers,
}

impl Related<super::platforms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Platforms.def()
    }
}

impl Related<super::shows_to_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShowsToUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
