use std::sync::Arc;

use crate::application::repos::{EventsRepo, PostsRepo, PostsWriteRepo, SearchIndex};

/// Commands and queries over posts, their events and their search documents.
#[derive(Clone)]
pub struct Repository {
    pub(crate) posts: Arc<dyn PostsRepo>,
    pub(crate) writer: Arc<dyn PostsWriteRepo>,
    pub(crate) events: Arc<dyn EventsRepo>,
    pub(crate) index: Arc<dyn SearchIndex>,
}

impl Repository {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        events: Arc<dyn EventsRepo>,
        index: Arc<dyn SearchIndex>,
    ) -> Self {
        Self {
            posts,
            writer,
            events,
            index,
        }
    }
}
