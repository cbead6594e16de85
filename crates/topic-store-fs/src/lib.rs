//! Implementation of topic storage using one JSON file per topic on disk.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{self, AsyncWriteExt};
use topicbridge_topic_store::{Topic, TopicFilter, TopicId, TopicStore, sort_topics};
use tracing::warn;

static EXTENSION: &str = "json";

/// Topic store using files on disk.
#[derive(Clone, Debug)]
pub struct FsTopicStore {
    dir: PathBuf,
}

impl FsTopicStore {
    /// Creates a new `FsTopicStore` rooted at `dir`. The directory is created
    /// on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn get_file_path(&self, id: TopicId) -> PathBuf {
        self.dir.join(format!("{id}.{EXTENSION}"))
    }

    async fn read_topic(path: PathBuf) -> Result<Option<Topic>, Error> {
        match fs::read(path).await {
            Ok(data) => serde_json::from_slice(&data)
                .map(Some)
                .map_err(|e| Error::Json("error decoding topic", e)),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io("error reading file", e)),
        }
    }
}

#[async_trait]
impl TopicStore for FsTopicStore {
    type Error = Error;

    async fn save(&self, mut topic: Topic) -> Result<Topic, Self::Error> {
        let id = *topic.id.get_or_insert_with(TopicId::generate);

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::Io("error creating directory", e))?;

        let bytes = serde_json::to_vec_pretty(&topic)
            .map_err(|e| Error::Json("error encoding topic", e))?;

        // Write then rename so readers never see a partial file.
        let path = self.get_file_path(id);
        let tmp_path = path.with_extension("tmp");

        let mut file = fs::File::create(&tmp_path)
            .await
            .map_err(|e| Error::Io("error creating file", e))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| Error::Io("error writing file", e))?;
        file.sync_all()
            .await
            .map_err(|e| Error::Io("error syncing file", e))?;

        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| Error::Io("error renaming file", e))?;

        Ok(topic)
    }

    async fn get(&self, id: TopicId) -> Result<Option<Topic>, Self::Error> {
        Self::read_topic(self.get_file_path(id)).await
    }

    async fn delete(&self, id: TopicId) -> Result<(), Self::Error> {
        match fs::remove_file(self.get_file_path(id)).await {
            Ok(()) => Ok(()),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io("error deleting file", e)),
        }
    }

    async fn list(&self, filter: &TopicFilter) -> Result<Vec<Topic>, Self::Error> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io("error reading directory", e)),
        };

        let mut topics = Vec::new();

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::Io("error reading directory entry", e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }

            match Self::read_topic(path.clone()).await {
                Ok(Some(topic)) if filter.matches(&topic) => topics.push(topic),
                Ok(_) => {}
                Err(e) => warn!(path = %path.display(), "skipping unreadable topic: {e}"),
            }
        }

        sort_topics(&mut topics);
        Ok(topics)
    }
}
