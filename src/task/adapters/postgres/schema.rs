//! Diesel schema for task persistence.

diesel::table! {
    /// Organizational departments.
    departments (id) {
        /// Department identifier.
        id -> Int8,
        /// Unique display name.
        #[max_length = 255]
        name -> Varchar,
        /// `ADMINISTRATIVO` or `OPERATIVO`.
        #[max_length = 50]
        kind -> Varchar,
    }
}

diesel::table! {
    /// People who create and execute tasks.
    users (id) {
        /// User identifier.
        id -> Int8,
        /// Display name.
        #[max_length = 255]
        display_name -> Varchar,
        /// Unique login.
        #[max_length = 255]
        login -> Varchar,
        /// Credential hash, never returned by services.
        password_hash -> Text,
        /// Role name.
        #[max_length = 50]
        role -> Varchar,
        /// Department, empty only for super administrators.
        department_id -> Nullable<Int8>,
        /// `ACTIVO` or `INACTIVO`.
        #[max_length = 50]
        status -> Varchar,
    }
}

diesel::table! {
    /// Task aggregate roots.
    tasks (id) {
        /// Task identifier.
        id -> Int8,
        /// Title.
        #[max_length = 255]
        title -> Varchar,
        /// Free-form notes.
        notes -> Text,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Urgency.
        #[max_length = 50]
        urgency -> Varchar,
        /// Owning department.
        department_id -> Int8,
        /// Creating user.
        creator_id -> Int8,
        /// Deadline instant.
        deadline -> Timestamptz,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Set on approval or completion.
        completed_at -> Nullable<Timestamptz>,
        /// Set on delivery.
        delivered_at -> Nullable<Timestamptz>,
        /// Delivery comment.
        delivery_comment -> Nullable<Text>,
        /// Set on review.
        reviewed_at -> Nullable<Timestamptz>,
        /// Review feedback.
        review_feedback -> Nullable<Text>,
    }
}

diesel::table! {
    /// Responsible users per task.
    task_responsibles (task_id, user_id) {
        /// Task identifier.
        task_id -> Int8,
        /// Responsible user.
        user_id -> Int8,
    }
}

diesel::table! {
    /// Append-only deadline history.
    deadline_changes (id) {
        /// Change identifier.
        id -> Int8,
        /// Task identifier.
        task_id -> Int8,
        /// Deadline before the change.
        previous_deadline -> Timestamptz,
        /// Deadline after the change.
        new_deadline -> Timestamptz,
        /// Optional reason.
        reason -> Nullable<Text>,
        /// How the change came about.
        #[max_length = 50]
        kind -> Varchar,
        /// User who made the change.
        changed_by -> Int8,
        /// Change timestamp.
        changed_at -> Timestamptz,
    }
}

diesel::table! {
    /// Images attached to tasks.
    task_images (id) {
        /// Image identifier.
        id -> Int8,
        /// Task identifier.
        task_id -> Int8,
        /// Object storage URL.
        url -> Text,
        /// Upload timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only audit trail.
    audit_entries (id) {
        /// Entry identifier.
        id -> Uuid,
        /// Action code.
        #[max_length = 50]
        action -> Varchar,
        /// Human-readable description.
        description -> Text,
        /// Acting user, when known.
        actor_id -> Nullable<Int8>,
        /// Structured details.
        details -> Jsonb,
        /// Entry timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Browser push registrations.
    push_registrations (id) {
        /// Registration identifier.
        id -> Uuid,
        /// Owning user.
        user_id -> Int8,
        /// Unique push service endpoint.
        endpoint -> Text,
        /// Client public key.
        p256dh -> Text,
        /// Client auth secret.
        auth -> Text,
    }
}

diesel::joinable!(users -> departments (department_id));
diesel::joinable!(tasks -> departments (department_id));
diesel::joinable!(task_responsibles -> tasks (task_id));
diesel::joinable!(task_responsibles -> users (user_id));
diesel::joinable!(deadline_changes -> tasks (task_id));
diesel::joinable!(task_images -> tasks (task_id));
diesel::joinable!(push_registrations -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    departments,
    users,
    tasks,
    task_responsibles,
    deadline_changes,
    task_images,
    audit_entries,
    push_registrations,
);
