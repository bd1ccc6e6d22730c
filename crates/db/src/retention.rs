use meter_core::Level;

use crate::Db;
use crate::error::Result;

impl Db {
    /// Physically delete `Merged` rows at one level. Promotion never deletes;
    /// this runs only for levels named by the retention configuration.
    pub fn purge_merged(&mut self, level: Level) -> Result<usize> {
        let deleted = self.conn.execute(
            &format!("DELETE FROM {} WHERE status = 'Merged'", level.table()),
            [],
        )?;
        Ok(deleted)
    }
}
