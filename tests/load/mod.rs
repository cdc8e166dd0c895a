mod concurrent_sessions;
