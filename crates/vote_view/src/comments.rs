use domain::Comment;

/// Comments shown before the list is expanded
pub const COMMENT_PREVIEW: usize = 5;

/// Avatar used when the author has none
pub const PLACEHOLDER_AVATAR: &str = "/api/placeholder/40/40";

/// Fetched comments plus the collapsed/expanded toggle
#[derive(Debug, Clone, Default)]
pub struct CommentList {
    comments: Vec<Comment>,
    expanded: bool,
}

impl CommentList {
    pub fn new(comments: Vec<Comment>) -> Self {
        Self {
            comments,
            expanded: false,
        }
    }

    /// Swap in a freshly fetched list; the expansion toggle is kept
    pub fn replace(&mut self, comments: Vec<Comment>) {
        self.comments = comments;
    }

    pub fn visible(&self) -> &[Comment] {
        if self.expanded {
            &self.comments
        } else {
            &self.comments[..self.comments.len().min(COMMENT_PREVIEW)]
        }
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Whether there is anything for the expand toggle to reveal
    pub fn has_more(&self) -> bool {
        self.comments.len() > COMMENT_PREVIEW
    }

    /// Comments beyond the preview
    pub fn hidden_count(&self) -> usize {
        self.comments.len().saturating_sub(COMMENT_PREVIEW)
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
    }
}

pub fn avatar_url(comment: &Comment) -> &str {
    if comment.author_profile_img.is_empty() {
        PLACEHOLDER_AVATAR
    } else {
        &comment.author_profile_img
    }
}
