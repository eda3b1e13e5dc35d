pub(crate) mod last_event_id;
