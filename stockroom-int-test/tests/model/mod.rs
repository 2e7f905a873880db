mod find_test;
mod populate_test;
mod update_delete_test;
