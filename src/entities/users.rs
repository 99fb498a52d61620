use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Household member's display name
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::shows_to_users::Entity")]
    ShowsToUsers,
}

impl Related<super::shows_to_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShowsToUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
