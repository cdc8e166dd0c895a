mod lobby_lifecycle;
mod socket_transport;
