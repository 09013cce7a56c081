use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::{self, Bson, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};

use crate::comment::model::{Comment, NewComment};
use crate::database::store::{Store, StoreError};
use crate::group::model::{Group, GroupRef, NewGroup};
use crate::post::post_model::{NewPost, Post, PostChanges, PostFilter};
use crate::user::model::{NewUser, User};

const DUPLICATE_KEY: i32 = 11000;

fn to_bson_date(at: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

fn from_bson_date(at: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or_default()
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

fn group_ref_bson(group: Option<&GroupRef>) -> Bson {
    match group {
        Some(g) => Bson::Document(doc! { "id": g.id, "slug": &g.slug, "title": &g.title }),
        None => Bson::Null,
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Counter {
    #[serde(rename = "_id")]
    id: String,
    seq: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: i64,
    username: String,
    password: String,
    is_staff: bool,
    date_joined: bson::DateTime,
}

impl From<UserDocument> for User {
    fn from(d: UserDocument) -> Self {
        User {
            id: d.id,
            username: d.username,
            password: d.password,
            is_staff: d.is_staff,
            date_joined: from_bson_date(d.date_joined),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GroupDocument {
    #[serde(rename = "_id")]
    id: i64,
    title: String,
    slug: String,
    description: String,
}

impl From<GroupDocument> for Group {
    fn from(d: GroupDocument) -> Self {
        Group {
            id: d.id,
            title: d.title,
            slug: d.slug,
            description: d.description,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PostDocument {
    #[serde(rename = "_id")]
    id: i64,
    text: String,
    pub_date: bson::DateTime,
    author_id: i64,
    author_username: String,
    group: Option<GroupRef>,
    image: Option<String>,
}

impl From<PostDocument> for Post {
    fn from(d: PostDocument) -> Self {
        Post {
            id: d.id,
            text: d.text,
            pub_date: from_bson_date(d.pub_date),
            author_id: d.author_id,
            author_username: d.author_username,
            group: d.group,
            image: d.image,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CommentDocument {
    #[serde(rename = "_id")]
    id: i64,
    post_id: i64,
    author_id: i64,
    author_username: String,
    text: String,
    created_at: bson::DateTime,
}

impl From<CommentDocument> for Comment {
    fn from(d: CommentDocument) -> Self {
        Comment {
            id: d.id,
            post_id: d.post_id,
            author_id: d.author_id,
            author_username: d.author_username,
            text: d.text,
            created_at: from_bson_date(d.created_at),
        }
    }
}

fn post_filter(filter: PostFilter) -> Document {
    match filter {
        PostFilter::All => doc! {},
        PostFilter::Group(id) => doc! { "group.id": id },
        PostFilter::Author(id) => doc! { "author_id": id },
    }
}

/// MongoDB backend. Integer ids come from the `counters` collection so
/// URLs stay `/posts/<int>/`.
pub struct MongoStore {
    counters: Collection<Counter>,
    users: Collection<UserDocument>,
    groups: Collection<GroupDocument>,
    posts: Collection<PostDocument>,
    comments: Collection<CommentDocument>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        MongoStore {
            counters: db.collection("counters"),
            users: db.collection("users"),
            groups: db.collection("groups"),
            posts: db.collection("posts"),
            comments: db.collection("comments"),
        }
    }

    /// Creates the unique and listing indexes. Safe to call on every start.
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let unique = IndexOptions::builder().unique(true).build();

        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(unique.clone())
                    .build(),
            )
            .await?;
        self.groups
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "slug": 1 })
                    .options(unique)
                    .build(),
            )
            .await?;
        for keys in [
            doc! { "pub_date": -1, "_id": -1 },
            doc! { "group.id": 1, "pub_date": -1 },
            doc! { "author_id": 1, "pub_date": -1 },
        ] {
            self.posts
                .create_index(IndexModel::builder().keys(keys).build())
                .await?;
        }
        self.comments
            .create_index(IndexModel::builder().keys(doc! { "post_id": 1 }).build())
            .await?;

        Ok(())
    }

    async fn next_id(&self, sequence: &str) -> Result<i64, StoreError> {
        let counter = self
            .counters
            .find_one_and_update(doc! { "_id": sequence }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| StoreError::Sequence(sequence.to_string()))?;
        Ok(counter.seq)
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let document = UserDocument {
            id: self.next_id("users").await?,
            username: user.username,
            password: user.password,
            is_staff: user.is_staff,
            date_joined: to_bson_date(user.date_joined),
        };
        match self.users.insert_one(&document).await {
            Ok(_) => Ok(document.into()),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate("username".into())),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.users.find_one(doc! { "_id": id }).await?.map(User::from))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .find_one(doc! { "username": username })
            .await?
            .map(User::from))
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        let result = self.users.delete_one(doc! { "_id": id }).await?;
        if result.deleted_count == 0 {
            return Ok(false);
        }

        let post_ids: Vec<i64> = self
            .posts
            .clone_with_type::<Document>()
            .find(doc! { "author_id": id })
            .projection(doc! { "_id": 1 })
            .await?
            .try_collect::<Vec<Document>>()
            .await?
            .iter()
            .filter_map(|d| d.get_i64("_id").ok())
            .collect();

        self.comments
            .delete_many(doc! { "$or": [ { "author_id": id }, { "post_id": { "$in": post_ids } } ] })
            .await?;
        self.posts.delete_many(doc! { "author_id": id }).await?;
        Ok(true)
    }

    async fn insert_group(&self, group: NewGroup) -> Result<Group, StoreError> {
        let document = GroupDocument {
            id: self.next_id("groups").await?,
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        match self.groups.insert_one(&document).await {
            Ok(_) => Ok(document.into()),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate("group slug".into())),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_group(&self, id: i64) -> Result<Option<Group>, StoreError> {
        Ok(self.groups.find_one(doc! { "_id": id }).await?.map(Group::from))
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>, StoreError> {
        Ok(self
            .groups
            .find_one(doc! { "slug": slug })
            .await?
            .map(Group::from))
    }

    async fn list_groups(&self) -> Result<Vec<Group>, StoreError> {
        let groups: Vec<GroupDocument> = self
            .groups
            .find(doc! {})
            .sort(doc! { "title": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(groups.into_iter().map(Group::from).collect())
    }

    async fn delete_group(&self, id: i64) -> Result<bool, StoreError> {
        let result = self.groups.delete_one(doc! { "_id": id }).await?;
        if result.deleted_count == 0 {
            return Ok(false);
        }

        self.posts
            .update_many(doc! { "group.id": id }, doc! { "$set": { "group": Bson::Null } })
            .await?;
        Ok(true)
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let document = PostDocument {
            id: self.next_id("posts").await?,
            text: post.text,
            pub_date: to_bson_date(post.pub_date),
            author_id: post.author_id,
            author_username: post.author_username,
            group: post.group,
            image: post.image,
        };
        self.posts.insert_one(&document).await?;
        Ok(document.into())
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, StoreError> {
        Ok(self.posts.find_one(doc! { "_id": id }).await?.map(Post::from))
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Option<Post>, StoreError> {
        let mut set = doc! {
            "text": changes.text,
            "group": group_ref_bson(changes.group.as_ref()),
        };
        if let Some(image) = changes.image {
            set.insert("image", image);
        }

        let updated = self
            .posts
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated.map(Post::from))
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<u64, StoreError> {
        Ok(self.posts.count_documents(post_filter(filter)).await?)
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, StoreError> {
        let posts: Vec<PostDocument> = self
            .posts
            .find(post_filter(filter))
            .sort(doc! { "pub_date": -1, "_id": -1 })
            .skip(offset)
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;
        Ok(posts.into_iter().map(Post::from).collect())
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let document = CommentDocument {
            id: self.next_id("comments").await?,
            post_id: comment.post_id,
            author_id: comment.author_id,
            author_username: comment.author_username,
            text: comment.text,
            created_at: to_bson_date(comment.created_at),
        };
        self.comments.insert_one(&document).await?;
        Ok(document.into())
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, StoreError> {
        let comments: Vec<CommentDocument> = self
            .comments
            .find(doc! { "post_id": post_id })
            .sort(doc! { "created_at": 1, "_id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(comments.into_iter().map(Comment::from).collect())
    }
}

pub async fn connect_to_mongo(uri: &str, database: &str) -> Result<MongoStore, StoreError> {
    let mut client_options = ClientOptions::parse(uri).await?;
    client_options.app_name = Some("yatube".to_string());

    let client = Client::with_options(client_options)?;

    // Ping the server to see if you can connect to the cluster
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await?;

    log::info!("Connected successfully to MongoDB");

    let store = MongoStore::new(&client.database(database));
    store.ensure_indexes().await?;
    Ok(store)
}
